/// Number of posts shown on each listing page.
pub const PAGE_SIZE: u32 = 10;

/// A one-based page number in a listing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Page(u32);

impl Page {
    /// Interpret the `page` query parameter.
    ///
    /// Anything missing, unparseable or zero is the first page.
    pub fn from_query(raw: Option<&str>) -> Self {
        Page(
            raw.and_then(|s| s.trim().parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(1),
        )
    }
    pub fn number(self) -> u32 {
        self.0
    }
    pub fn offset(self) -> i64 {
        i64::from(self.0 - 1) * i64::from(PAGE_SIZE)
    }
    /// Fetch one row more than shown to know if there is a next page.
    pub fn fetch_limit(self) -> i64 {
        i64::from(PAGE_SIZE) + 1
    }
}

impl Default for Page {
    fn default() -> Self {
        Page(1)
    }
}

/// One page of a listing.
#[derive(Debug)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: Page,
    has_next: bool,
}

impl<T> Paged<T> {
    /// Wrap rows fetched with [`Page::fetch_limit`].
    pub fn from_fetched(mut items: Vec<T>, page: Page) -> Self {
        let has_next = items.len() > PAGE_SIZE as usize;
        items.truncate(PAGE_SIZE as usize);
        Paged {
            items,
            page,
            has_next,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn prev(&self) -> Option<u32> {
        Some(self.page.0 - 1).filter(|&n| n > 0)
    }
    pub fn next(&self) -> Option<u32> {
        self.has_next.then_some(self.page.0 + 1)
    }
}
