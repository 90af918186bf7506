mod fetcher;

pub use fetcher::HeadlineFetcher;
