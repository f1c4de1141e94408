// Interactive message views shared by the commands.

pub mod confirm;
pub mod paginate;
pub mod select;

pub use confirm::confirm;
pub use paginate::paginate;
pub use select::{select_many, SelectOption, MAX_OPTIONS};
