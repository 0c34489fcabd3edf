use serde::Deserialize;

/// Standard pagination query parameters: `?page=1&per_page=20`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl PaginationQuery {
    /// Page and per-page clamped to sane bounds.
    #[must_use]
    pub fn clamped(&self) -> (u32, u32) {
        (self.page.max(1), self.per_page.clamp(1, 100))
    }

    /// Zero-based offset into the result set.
    #[must_use]
    pub fn offset(&self) -> usize {
        let (page, per_page) = self.clamped();
        ((page - 1) as usize) * (per_page as usize)
    }
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let q = PaginationQuery::default();
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 20);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let q = PaginationQuery { page: 3, per_page: 10 };
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn test_clamping() {
        let q = PaginationQuery { page: 0, per_page: 5000 };
        assert_eq!(q.clamped(), (1, 100));
        assert_eq!(q.offset(), 0);
    }
}
