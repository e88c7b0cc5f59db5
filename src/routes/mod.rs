pub mod health;
pub mod itinerary;
pub mod trip;
pub mod upload;
pub mod vault;
