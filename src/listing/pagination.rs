//! Fixed-size pages over a filtered listing

/// Page `page` (1-indexed) of `items`; empty when the page is out of range
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Current page and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: usize,
    pub page_size: usize,
}

impl PaginationState {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size,
        }
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    pub fn total_pages(&self, count: usize) -> usize {
        total_pages(count, self.page_size)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        paginate(items, self.current_page, self.page_size)
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_reconstruct_input() {
        let items: Vec<u32> = (0..29).collect();
        let pages = total_pages(items.len(), 12);
        assert_eq!(pages, 3);

        let mut joined = Vec::new();
        for page in 1..=pages {
            let slice = paginate(&items, page, 12);
            assert!(slice.len() <= 12);
            joined.extend_from_slice(slice);
        }
        assert_eq!(joined, items);
        assert_eq!(paginate(&items, 3, 12).len(), 5);
    }

    #[test]
    fn test_out_of_range_pages_are_empty() {
        let items = [1, 2, 3];
        assert!(paginate(&items, 0, 12).is_empty());
        assert!(paginate(&items, 2, 12).is_empty());
        assert!(paginate(&items, usize::MAX, 12).is_empty());
        assert!(paginate(&items, 1, 0).is_empty());
        assert!(paginate::<u8>(&[], 1, 12).is_empty());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 12), 0);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
        assert_eq!(PaginationState::default().total_pages(1), 1);
    }
}
