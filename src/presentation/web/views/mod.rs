mod results;

pub use results::BookResultView;
