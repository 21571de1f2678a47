use sea_orm::{ConnectionTrait, DbErr, PaginatorTrait, Selector, SelectorTrait};

/// Every feed in the app is split into pages of this many posts.
pub const PAGE_SIZE: u64 = 10;

const PAGINATOR_LOOK_AHEAD: u64 = 2;

/// One window of an ordered collection.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, always within `1..=num_pages`.
    pub number: u64,
    /// At least 1, even for an empty collection.
    pub num_pages: u64,
    pub total_count: u64,
}

/// A single entry of the page-link strip. `gap` entries render as an ellipsis.
#[derive(Debug, PartialEq, Eq)]
pub struct PageLink {
    pub number: u64,
    pub current: bool,
    pub gap: bool,
}

impl<T> Page<T> {
    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> u64 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> u64 {
        (self.number + 1).min(self.num_pages)
    }

    /// [1] 2 3 ... 13
    /// 1 2 [3] 4 5 ... 13
    /// 1 ... 4 5 [6] 7 8 ... 13
    /// 1 ... 9 10 [11] 12 13
    pub fn links(&self) -> Vec<PageLink> {
        let mut links = Vec::new();
        if !self.has_other_pages() {
            return links;
        }

        let window_start = self.number.saturating_sub(PAGINATOR_LOOK_AHEAD).max(1);
        let window_end = (self.number + PAGINATOR_LOOK_AHEAD).min(self.num_pages);
        let mut last = 0;

        let mut push = |links: &mut Vec<PageLink>, number: u64| {
            if number <= last {
                return;
            }
            if number > last + 1 {
                links.push(PageLink {
                    number: 0,
                    current: false,
                    gap: true,
                });
            }
            links.push(PageLink {
                number,
                current: number == self.number,
                gap: false,
            });
            last = number;
        };

        push(&mut links, 1);
        for number in window_start..=window_end {
            push(&mut links, number);
        }
        push(&mut links, self.num_pages);

        links
    }
}

/// Resolves the `?page=` value against the page count.
/// Missing or non-numeric values mean the first page; anything out of range
/// means the last page.
pub fn clamp_page_number(requested: Option<&str>, num_pages: u64) -> u64 {
    let num_pages = num_pages.max(1);
    match requested.and_then(|raw| raw.trim().parse::<i64>().ok()) {
        None => 1,
        Some(n) if n >= 1 && (n as u64) <= num_pages => n as u64,
        Some(_) => num_pages,
    }
}

fn count_pages(total_count: u64, page_size: u64) -> u64 {
    let page_size = page_size.max(1);
    ((total_count + page_size - 1) / page_size).max(1)
}

/// Where a requested page falls in a collection, known before any rows
/// are fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub total_count: u64,
}

impl PageWindow {
    pub fn locate(total_count: u64, page_size: u64, requested: Option<&str>) -> Self {
        let num_pages = count_pages(total_count, page_size);
        Self {
            number: clamp_page_number(requested, num_pages),
            num_pages,
            total_count,
        }
    }

    pub fn with_items<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total_count: self.total_count,
        }
    }
}

/// Counts the query and resolves the requested page without fetching rows.
pub async fn locate_page<'db, C, S>(
    db: &'db C,
    selector: Selector<S>,
    page_size: u64,
    requested: Option<&str>,
) -> Result<PageWindow, DbErr>
where
    C: ConnectionTrait,
    S: SelectorTrait + Send + Sync + 'db,
{
    let total_count = selector.paginate(db, page_size.max(1)).num_items().await?;
    Ok(PageWindow::locate(total_count, page_size, requested))
}

/// Fetches the rows of an already located page.
pub async fn fetch_page<'db, C, S>(
    db: &'db C,
    selector: Selector<S>,
    page_size: u64,
    window: PageWindow,
) -> Result<Page<S::Item>, DbErr>
where
    C: ConnectionTrait,
    S: SelectorTrait + Send + Sync + 'db,
{
    let items = selector
        .paginate(db, page_size.max(1))
        .fetch_page(window.number - 1)
        .await?;
    Ok(window.with_items(items))
}

/// Counts the query and fetches only the requested window from the store.
pub async fn paginate_query<'db, C, S>(
    db: &'db C,
    selector: Selector<S>,
    page_size: u64,
    requested: Option<&str>,
) -> Result<Page<S::Item>, DbErr>
where
    C: ConnectionTrait,
    S: SelectorTrait + Send + Sync + 'db,
{
    let paginator = selector.paginate(db, page_size.max(1));
    let window = PageWindow::locate(paginator.num_items().await?, page_size, requested);
    let items = paginator.fetch_page(window.number - 1).await?;
    Ok(window.with_items(items))
}
