pub mod campaign;
pub mod donation;
pub mod health_package;

pub use campaign::Entity as Campaigns;
pub use donation::Entity as Donations;
pub use health_package::Entity as HealthPackages;
