pub mod fetcher;
pub mod fixtures;

pub use fetcher::ReqwestFeedFetcher;
pub use fixtures::FixtureFetcher;
