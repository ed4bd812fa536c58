use crate::config::toml_config::LayoutConfig;
use crate::core::normalize::normalize;
use crate::core::{
    ArtworkCache, CardRequest, Document, LayoutStrategy, Page, PageSize, Placement, Slot,
};

/// Fixed rows × columns of equal cells, centred on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    rows: usize,
    cols: usize,
    cell_width: f64,
    cell_height: f64,
    page: PageSize,
    start_x: f64,
    start_y: f64,
}

impl GridLayout {
    pub fn new(
        rows: usize,
        cols: usize,
        cell_width: f64,
        cell_height: f64,
        page: PageSize,
    ) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        // 邊界只算一次，讓整個網格置中
        let start_x = (page.width_mm - cols as f64 * cell_width) / 2.0;
        let start_y = (page.height_mm - rows as f64 * cell_height) / 2.0;
        Self {
            rows,
            cols,
            cell_width,
            cell_height,
            page,
            start_x,
            start_y,
        }
    }

    /// 3 × 3 standard-size cards (63 × 88 mm) on A4.
    pub fn standard() -> Self {
        Self::new(3, 3, 63.0, 88.0, PageSize::A4)
    }

    /// One 180 × 250 mm card per A4 page.
    pub fn full_page() -> Self {
        Self::new(1, 1, 180.0, 250.0, PageSize::A4)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Top-left corner of the grid, in millimetres.
    pub fn origin(&self) -> (f64, f64) {
        (self.start_x, self.start_y)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<&LayoutConfig> for GridLayout {
    fn from(config: &LayoutConfig) -> Self {
        Self::new(
            config.rows,
            config.cols,
            config.card_width_mm,
            config.card_height_mm,
            PageSize {
                width_mm: config.page_width_mm,
                height_mm: config.page_height_mm,
            },
        )
    }
}

impl LayoutStrategy for GridLayout {
    fn page_size(&self) -> PageSize {
        self.page
    }

    fn cell_size(&self) -> (f64, f64) {
        (self.cell_width, self.cell_height)
    }

    fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    fn slot(&self, index: usize) -> Slot {
        let capacity = self.capacity();
        let within_page = index % capacity;
        let row = within_page / self.cols;
        let col = within_page % self.cols;
        Slot {
            page_index: index / capacity,
            row,
            col,
            x: self.start_x + col as f64 * self.cell_width,
            y: self.start_y + row as f64 * self.cell_height,
            width: self.cell_width,
            height: self.cell_height,
        }
    }
}

/// Expands `entries` by count, drops keys missing from `images` and puts
/// the survivors into slots in strict row-major, page-by-page order.
pub fn layout(
    entries: &[CardRequest],
    images: &ArtworkCache,
    strategy: &dyn LayoutStrategy,
) -> Document {
    let survivors = entries
        .iter()
        .map(|entry| (normalize(&entry.name), entry.count))
        .filter(|(key, _)| images.contains(key))
        .flat_map(|(key, count)| std::iter::repeat(key).take(count as usize));

    let mut pages: Vec<Page> = Vec::new();
    for (index, key) in survivors.enumerate() {
        let placement = Placement::at(strategy.slot(index), key);
        match pages.last_mut() {
            Some(page) if page.index == placement.page_index => page.placements.push(placement),
            _ => pages.push(Page {
                index: placement.page_index,
                placements: vec![placement],
            }),
        }
    }

    Document {
        page_size: strategy.page_size(),
        pages,
    }
}
