mod autocomplete;
mod fetcher;
mod suggestion;

pub use autocomplete::*;
pub use fetcher::*;
pub use suggestion::*;
