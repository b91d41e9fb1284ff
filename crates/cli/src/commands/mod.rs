pub mod bisect;
pub mod history;
pub mod util;
pub mod workspace;

pub use bisect::*;
pub use history::*;
pub use util::*;
pub use workspace::*;
