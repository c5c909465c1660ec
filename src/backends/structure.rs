//! Structure-analysis stub converter.
//!
//! Stands in for a layout-analysis engine: it "detects" headings, lists
//! and tables according to its flags and renders them as Markdown. The
//! analysis itself is fixed mock data; only the rendering path is real,
//! which is exactly what contract-level tests need.

use crate::backends::{ensure_exists, file_name, file_stem};
use crate::config::{ConvertOptions, ConverterConfig};
use crate::converter::Converter;
use crate::error::Image2MdError;
use std::path::Path;

/// Converts images to Markdown by analysing structural components (stubbed).
#[derive(Debug, Clone)]
pub struct StructureConverter {
    detect_tables: bool,
    detect_headings: bool,
    detect_lists: bool,
}

/// Mock analysis results for one image.
struct Analysis {
    title: String,
    headings: Vec<Heading>,
    paragraphs: Vec<&'static str>,
    lists: Vec<ListBlock>,
    tables: Vec<Table>,
}

struct Heading {
    level: usize,
    text: &'static str,
}

enum ListBlock {
    Unordered(Vec<&'static str>),
    Ordered(Vec<&'static str>),
}

struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<&'static str>>,
}

impl StructureConverter {
    pub fn new(detect_tables: bool, detect_headings: bool, detect_lists: bool) -> Self {
        Self {
            detect_tables,
            detect_headings,
            detect_lists,
        }
    }

    /// Build from a registry configuration bag. Unrelated fields are ignored.
    pub fn from_config(config: &ConverterConfig) -> Result<Self, Image2MdError> {
        Ok(Self {
            detect_tables: config.detect_tables.unwrap_or(true),
            detect_headings: config.detect_headings.unwrap_or(true),
            detect_lists: config.detect_lists.unwrap_or(true),
        })
    }

    fn analyze(&self, image_path: &Path) -> Analysis {
        Analysis {
            title: format!("Document from {}", file_stem(image_path)),
            headings: if self.detect_headings {
                vec![
                    Heading { level: 1, text: "Main Heading" },
                    Heading { level: 2, text: "Section 1" },
                    Heading { level: 2, text: "Section 2" },
                ]
            } else {
                Vec::new()
            },
            paragraphs: vec![
                "This is the first paragraph of text extracted from the image.",
                "This is another paragraph with more detailed information.",
            ],
            lists: if self.detect_lists {
                vec![
                    ListBlock::Unordered(vec!["Item 1", "Item 2", "Item 3"]),
                    ListBlock::Ordered(vec!["First step", "Second step", "Third step"]),
                ]
            } else {
                Vec::new()
            },
            tables: if self.detect_tables {
                vec![Table {
                    headers: vec!["Column 1", "Column 2", "Column 3"],
                    rows: vec![
                        vec!["Data 1A", "Data 1B", "Data 1C"],
                        vec!["Data 2A", "Data 2B", "Data 2C"],
                    ],
                }]
            } else {
                Vec::new()
            },
        }
    }

    fn render(&self, image_path: &Path, analysis: Analysis) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n", analysis.title));
        md.push_str(&format!("*Source: {}*\n", file_name(image_path)));

        // Interleave the first paragraphs under the detected headings, the
        // rest follow as plain body text.
        let mut paragraphs = analysis.paragraphs.into_iter();
        for heading in &analysis.headings {
            md.push_str(&format!("{} {}\n", "#".repeat(heading.level), heading.text));
            if let Some(para) = paragraphs.next() {
                md.push_str(&format!("{}\n", para));
            }
        }
        for para in paragraphs {
            md.push_str(&format!("{}\n\n", para));
        }

        for list in &analysis.lists {
            md.push('\n');
            match list {
                ListBlock::Unordered(items) => {
                    for item in items {
                        md.push_str(&format!("- {}\n", item));
                    }
                }
                ListBlock::Ordered(items) => {
                    for (i, item) in items.iter().enumerate() {
                        md.push_str(&format!("{}. {}\n", i + 1, item));
                    }
                }
            }
            md.push('\n');
        }

        for table in &analysis.tables {
            md.push_str(&format!("| {} |\n", table.headers.join(" | ")));
            md.push_str(&format!(
                "| {} |\n",
                vec!["---"; table.headers.len()].join(" | ")
            ));
            for row in &table.rows {
                md.push_str(&format!("| {} |\n", row.join(" | ")));
            }
            md.push('\n');
        }

        md
    }
}

impl Default for StructureConverter {
    fn default() -> Self {
        Self::new(true, true, true)
    }
}

impl Converter for StructureConverter {
    fn convert(&self, image_path: &Path, _options: &ConvertOptions) -> Result<String, Image2MdError> {
        ensure_exists(image_path)?;
        let analysis = self.analyze(image_path);
        Ok(self.render(image_path, analysis))
    }
}
