mod fetch_settings;

pub use fetch_settings::FetchSettings;
