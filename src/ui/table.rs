use crate::record::PageMeta;
use crate::ui::output::draft_marker;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// One line of a directory listing
#[derive(Tabled)]
pub struct PageRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&PageMeta> for PageRow {
    fn from(meta: &PageMeta) -> Self {
        Self {
            date: meta.date.format("%Y-%m-%d %H:%M").to_string(),
            path: crate::IndexKey::join(&meta.directory, &meta.name),
            title: meta.title.clone(),
            status: draft_marker(meta),
        }
    }
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

pub fn pages_table(pages: &[PageMeta]) -> String {
    let rows: Vec<PageRow> = pages.iter().map(PageRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
