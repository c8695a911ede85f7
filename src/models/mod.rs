pub mod library;
pub mod movie;
pub mod requests;
pub mod user;

pub use library::{Library, LibraryEntry, ReviewEntry};
pub use movie::{
    CastMember, Credits, Genre, Movie, MovieDetails, MoviePage, SimilarMovies, TmdbId, Video,
    Videos,
};
pub use requests::{
    AuthResponse, LikeRequest, LikesResponse, LoginRequest, RegisterRequest, ReviewRequest,
    ReviewsResponse, WatchlistRequest, WatchlistResponse,
};
pub use user::{Session, User, UserProfile};
