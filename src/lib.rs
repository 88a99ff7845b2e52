pub mod api {
    pub mod errors;
    pub mod queries;
    pub mod recommendations;
}
pub mod auth {
    pub mod middleware;
    pub mod verifier;
}
pub mod db {
    pub mod models;
    pub mod queries;
    pub mod recommendations;
}
pub mod error;
pub mod router;
pub mod state;
