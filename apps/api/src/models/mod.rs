pub mod profile;
pub mod recommendation;

pub use profile::{DogProfile, DogProfileInput, DogProfileRow, InvalidProfile, StoredProfile};
pub use recommendation::{CategoryRecommendation, ProductScore, Recommendation, SimilarProduct};
