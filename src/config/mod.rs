pub mod settings;
pub mod users;

pub use settings::Settings;
pub use users::UserRegistry;
