use std::rc::Rc;

// Must match the .vst-row height in the page CSS.
pub const ROW_HEIGHT_PX: f64 = 44.0;
// Rows rendered above/below the visible window to mask scroll pop-in.
pub const OVERSCAN_ROWS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub columns: Vec<String>,
    pub href: String,
}

impl Record {
    pub fn label(&self) -> &str {
        match self.columns.first() {
            Some(label) if !label.is_empty() => label,
            _ => &self.key,
        }
    }
}

#[derive(Default)]
pub struct RecordStore {
    snapshot: Rc<Vec<Record>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, records: Vec<Record>) {
        self.snapshot = Rc::new(records);
    }

    pub fn size(&self) -> usize {
        self.snapshot.len()
    }

    pub fn snapshot(&self) -> &Rc<Vec<Record>> {
        &self.snapshot
    }
}

#[derive(Clone)]
pub struct FilteredView {
    snapshot: Rc<Vec<Record>>,
    subset: Option<Rc<Vec<usize>>>,
}

impl FilteredView {
    pub fn full(store: &RecordStore) -> Self {
        Self {
            snapshot: Rc::clone(store.snapshot()),
            subset: None,
        }
    }

    pub fn len(&self) -> usize {
        match &self.subset {
            Some(indices) => indices.len(),
            None => self.snapshot.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        match &self.subset {
            Some(indices) => self.snapshot.get(*indices.get(index)?),
            None => self.snapshot.get(index),
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.subset.is_some()
    }

    pub fn shares_snapshot(&self, store: &RecordStore) -> bool {
        Rc::ptr_eq(&self.snapshot, store.snapshot())
    }
}

#[derive(Default)]
pub struct FilterEngine {
    query: String,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_query(&mut self, raw: &str) {
        self.query = raw.trim().to_lowercase();
    }

    pub fn apply(&self, store: &RecordStore) -> FilteredView {
        if self.query.is_empty() {
            return FilteredView::full(store);
        }
        let indices = store
            .snapshot()
            .iter()
            .enumerate()
            .filter(|(_, record)| record_matches(record, &self.query))
            .map(|(index, _)| index)
            .collect();
        FilteredView {
            snapshot: Rc::clone(store.snapshot()),
            subset: Some(Rc::new(indices)),
        }
    }
}

fn record_matches(record: &Record, query: &str) -> bool {
    if record.key.to_lowercase().contains(query) {
        return true;
    }
    record
        .columns
        .iter()
        .any(|column| column.to_lowercase().contains(query))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderWindow {
    pub start: usize,
    pub end: usize,
    pub offset_y: f64,
    pub total_height: f64,
}

impl RenderWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

pub fn compute_window(
    scroll_top: f64,
    client_height: f64,
    row_height: f64,
    buffer: usize,
    total: usize,
) -> RenderWindow {
    let total_height = total as f64 * row_height;
    if total == 0 || row_height <= 0.0 {
        return RenderWindow {
            start: 0,
            end: 0,
            offset_y: 0.0,
            total_height: 0.0,
        };
    }

    let scroll_top = scroll_top.max(0.0);
    let client_height = client_height.max(0.0);

    let first_visible = (scroll_top / row_height).floor() as usize;
    let start = first_visible.saturating_sub(buffer);
    let last_visible = ((scroll_top + client_height) / row_height).ceil() as usize;
    let end = last_visible.saturating_add(buffer).min(total);
    let start = start.min(end);

    RenderWindow {
        start,
        end,
        offset_y: start as f64 * row_height,
        total_height,
    }
}

pub trait RowSlot {
    fn bind(&mut self, record: &Record);
}

#[derive(Default)]
pub struct NodePool<S> {
    slots: Vec<S>,
}

impl<S: RowSlot> NodePool<S> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn reconcile(
        &mut self,
        window: &RenderWindow,
        view: &FilteredView,
        mut create: impl FnMut() -> Option<S>,
    ) {
        let needed = window.len();

        // Excess nodes come off the tail; dropping a slot releases its row.
        self.slots.truncate(needed);

        for offset in 0..needed {
            let record = match view.get(window.start + offset) {
                Some(record) => record,
                None => {
                    self.slots.truncate(offset);
                    return;
                }
            };
            if let Some(slot) = self.slots.get_mut(offset) {
                slot.bind(record);
            } else if let Some(mut slot) = create() {
                slot.bind(record);
                self.slots.push(slot);
            } else {
                return;
            }
        }
    }
}

#[derive(Default)]
pub struct FrameGate {
    pending: bool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn finish(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

pub fn count_label(filtered: usize, total: usize) -> String {
    if filtered == total {
        group_thousands(filtered)
    } else {
        format!("{} of {}", group_thousands(filtered), group_thousands(total))
    }
}

pub fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
