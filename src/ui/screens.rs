use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::Customer;

use super::helpers::offset_index;

/// Entries of the main menu, in display order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum MenuItem {
    Import,
    Add,
    Pay,
    List,
    Report,
    Exit,
}

impl MenuItem {
    pub(crate) const ALL: [MenuItem; 6] = [
        MenuItem::Import,
        MenuItem::Add,
        MenuItem::Pay,
        MenuItem::List,
        MenuItem::Report,
        MenuItem::Exit,
    ];

    /// Digit that selects the entry from the menu.
    pub(crate) fn key(self) -> char {
        match self {
            MenuItem::Import => '1',
            MenuItem::Add => '2',
            MenuItem::Pay => '3',
            MenuItem::List => '4',
            MenuItem::Report => '5',
            MenuItem::Exit => '6',
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            MenuItem::Import => "Import customers from XML",
            MenuItem::Add => "Add customer",
            MenuItem::Pay => "Apply payment",
            MenuItem::List => "List customers",
            MenuItem::Report => "Print report",
            MenuItem::Exit => "Exit",
        }
    }

    pub(crate) fn from_key(ch: char) -> Option<MenuItem> {
        MenuItem::ALL.into_iter().find(|item| item.key() == ch)
    }
}

/// One row of the file picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PickerEntry {
    pub(crate) label: String,
    pub(crate) path: PathBuf,
    pub(crate) is_dir: bool,
}

/// Directory browser used to choose an XML file to import. Only directories
/// and `.xml` files are listed.
pub(crate) struct FilePicker {
    pub(crate) dir: PathBuf,
    pub(crate) entries: Vec<PickerEntry>,
    pub(crate) selected: usize,
}

impl FilePicker {
    pub(crate) fn open(dir: &Path) -> Result<Self> {
        let entries = list_entries(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
            selected: 0,
        })
    }

    pub(crate) fn current(&self) -> Option<&PickerEntry> {
        self.entries.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_index(self.selected, offset, self.entries.len());
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.entries.len().saturating_sub(1);
    }

    /// Replace the listing with the contents of `dir`.
    pub(crate) fn enter(&mut self, dir: &Path) -> Result<()> {
        self.entries = list_entries(dir)?;
        self.dir = dir.to_path_buf();
        self.selected = 0;
        Ok(())
    }

    /// Move to the parent directory, if there is one.
    pub(crate) fn leave(&mut self) -> Result<()> {
        match self.dir.parent().map(Path::to_path_buf) {
            Some(parent) => self.enter(&parent),
            None => Ok(()),
        }
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Directories first, then XML files, each group sorted case-insensitively.
/// A `..` entry leads to the parent directory when one exists.
fn list_entries(dir: &Path) -> Result<Vec<PickerEntry>> {
    let mut entries = Vec::new();
    let listing =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in listing {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        let path = entry.path();
        let is_dir = path.is_dir();
        if !is_dir && !is_xml(&path) {
            continue;
        }
        let mut label = entry.file_name().to_string_lossy().into_owned();
        if is_dir {
            label.push('/');
        }
        entries.push(PickerEntry {
            label,
            path,
            is_dir,
        });
    }

    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
    });

    if let Some(parent) = dir.parent() {
        entries.insert(
            0,
            PickerEntry {
                label: "../".to_string(),
                path: parent.to_path_buf(),
                is_dir: true,
            },
        );
    }

    Ok(entries)
}

/// Scrollable listing of every customer.
pub(crate) struct CustomerList {
    pub(crate) customers: Vec<Customer>,
    pub(crate) selected: usize,
}

impl CustomerList {
    pub(crate) fn new(customers: Vec<Customer>) -> Self {
        Self {
            customers,
            selected: 0,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_index(self.selected, offset, self.customers.len());
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.customers.len().saturating_sub(1);
    }

    /// First row to draw so the selection stays inside `height` visible rows.
    pub(crate) fn scroll_offset(&self, height: usize) -> usize {
        if height == 0 {
            return self.selected;
        }
        (self.selected + 1).saturating_sub(height)
    }
}

/// The rendered console table plus where its HTML twin was written.
pub(crate) struct ReportScreen {
    pub(crate) table: String,
    pub(crate) export_path: PathBuf,
    pub(crate) scroll: u16,
}

impl ReportScreen {
    pub(crate) fn new(table: String, export_path: PathBuf) -> Self {
        Self {
            table,
            export_path,
            scroll: 0,
        }
    }

    pub(crate) fn scroll_by(&mut self, offset: isize) {
        let lines = self.table.lines().count();
        self.scroll = offset_index(self.scroll as usize, offset, lines) as u16;
    }
}
