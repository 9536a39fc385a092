pub(crate) mod account;
pub(crate) mod auth;
pub(crate) mod pages;
pub(crate) mod posts;
