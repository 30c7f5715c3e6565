//! Generator for the HR estimate test workbook.
//!
//! - `conf`     : fixed file name, palette and limits
//! - `addr`     : A1 addressing helpers
//! - `model`    : in-memory workbook model
//! - `fixture`  : the fixture's data tables and sheet construction
//! - `writer`   : model → xlsx via umya-spreadsheet
//! - `snapshot` : content dump of a written file via calamine
pub mod addr;
pub mod conf;
pub mod fixture;
pub mod model;
pub mod snapshot;
pub mod writer;

pub use fixture::{build_workbook, create_test_workbook, run};
pub use model::Workbook;
pub use snapshot::{WorkbookSnapshot, snapshot};
pub use writer::{to_xlsx_bytes, write_xlsx};
