//! Step names used in logs and in wrapped errors.

/// Checkout: count the user's open reservations.
pub const STEP_LIST_RESERVATIONS: &str = "list_reservations";

/// Checkout: read the user's trust score.
pub const STEP_GET_RATING: &str = "get_rating";

/// Checkout: open the reservation in the ledger.
pub const STEP_CREATE_RESERVATION: &str = "create_reservation";

/// Checkout: decrement the library's available copies.
pub const STEP_TAKE_BOOK: &str = "take_book";

/// Return: load the reservation being closed.
pub const STEP_GET_RESERVATION: &str = "get_reservation";

/// Return: close the reservation and learn whether it was late.
pub const STEP_FINISH_RESERVATION: &str = "finish_reservation";

/// Return: restock the book and learn whether its condition degraded.
pub const STEP_RETURN_BOOK: &str = "return_book";

/// Return: apply the violation count to the trust score.
pub const STEP_SAVE_VIOLATIONS: &str = "save_violations";

/// Catalogue: list libraries in a city.
pub const STEP_LIST_LIBRARIES: &str = "list_libraries";

/// Catalogue: list books stocked by a library.
pub const STEP_LIST_BOOKS: &str = "list_books";

/// Withdraw a reservation from the ledger.
pub const STEP_CANCEL_RESERVATION: &str = "cancel_reservation";
