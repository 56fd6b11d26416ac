/// Parameters of a table read.
///
/// Row and column positions are offsets from the sheet's first populated row and column,
/// so a table anchored anywhere on the sheet reads the same way.
#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Offset of the header row (default: 0)
    pub header_offset: usize,
    /// Explicit field names, replacing the header row
    pub header: Option<Vec<String>>,
    /// First data row (default: the row after the header)
    pub data_start: Option<usize>,
    /// Last data row, inclusive; clipped to the last populated row
    pub data_end: Option<usize>,
    /// First column of the table (default: 0)
    pub col_start: usize,
    /// End column, exclusive; clipped to the last populated column
    pub col_end: Option<usize>,
    /// Key field of a dictionary read (default: the first header column)
    pub key_field: Option<String>,
    /// Remove the key field from each record of a dictionary read
    pub remove_key_in_element: bool,
    /// Skip rows that contain no data (default: true)
    pub skip_empty_rows: bool,
    /// Stop reading when encountering an empty row
    pub end_at_empty_row: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            header_offset: 0,
            header: None,
            data_start: None,
            data_end: None,
            col_start: 0,
            col_end: None,
            key_field: None,
            remove_key_in_element: false,
            skip_empty_rows: true,
            end_at_empty_row: false,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header_offset(mut self, header_offset: usize) -> Self {
        self.header_offset = header_offset;
        self
    }

    pub fn with_header<S: AsRef<str>>(mut self, header: &[S]) -> Self {
        self.header = Some(header.iter().map(|name| name.as_ref().to_owned()).collect());
        self
    }

    pub fn with_data_start(mut self, data_start: usize) -> Self {
        self.data_start = Some(data_start);
        self
    }

    pub fn with_data_end(mut self, data_end: usize) -> Self {
        self.data_end = Some(data_end);
        self
    }

    pub fn with_col_start(mut self, col_start: usize) -> Self {
        self.col_start = col_start;
        self
    }

    pub fn with_col_end(mut self, col_end: usize) -> Self {
        self.col_end = Some(col_end);
        self
    }

    pub fn with_key_field(mut self, key_field: &str) -> Self {
        self.key_field = Some(key_field.to_owned());
        self
    }

    pub fn with_remove_key_in_element(mut self, remove_key_in_element: bool) -> Self {
        self.remove_key_in_element = remove_key_in_element;
        self
    }

    pub fn with_skip_empty_rows(mut self, skip_empty_rows: bool) -> Self {
        self.skip_empty_rows = skip_empty_rows;
        self
    }

    pub fn with_end_at_empty_row(mut self, end_at_empty_row: bool) -> Self {
        self.end_at_empty_row = end_at_empty_row;
        self
    }

    /// First data row offset.
    pub(crate) fn data_start(&self) -> usize {
        self.data_start.unwrap_or(self.header_offset.saturating_add(1))
    }
}
