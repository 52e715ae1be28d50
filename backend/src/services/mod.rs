//! Business logic services for the cafe admin panel

pub mod activity;
pub mod material;
pub mod pricing;
pub mod recipe;
pub mod reporting;

#[cfg(test)]
pub mod test_support;

pub use activity::ActivityService;
pub use material::MaterialService;
pub use pricing::PricingService;
pub use recipe::RecipeService;
pub use reporting::ReportingService;
