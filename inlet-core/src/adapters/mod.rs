//! Adapter implementations
//!
//! Concrete parsers for each accepted statement format plus the in-memory
//! repository used by tests and the CLI demo flow:
//! - CSV / Excel share the column-mapping heuristics
//! - PDF runs the bank-profile pattern engine
//! - OFX / QIF are tag-streaming tokenizers

pub mod csv;
pub mod excel;
pub mod memory;
pub mod ofx;
pub mod pdf;
pub mod qif;

pub use csv::CsvParser;
pub use excel::ExcelParser;
pub use memory::MemoryRepository;
pub use ofx::OfxParser;
pub use pdf::PdfStatementParser;
pub use qif::QifParser;
