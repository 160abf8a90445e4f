//! Request listing: sort, paginate and the selection flows that drive them.

pub mod pagination;
pub mod requests;
pub mod sort;
