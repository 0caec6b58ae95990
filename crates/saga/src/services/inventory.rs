//! Inventory service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{BookUid, LibraryUid, Page, PageRequest};
use domain::{Book, BookCondition, DomainError, Library, LibraryBook};

use super::{ViolationReport, server_error, unavailable};
use crate::error::ServiceError;

/// Libraries, their catalogue and available-copy counters.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Lists libraries, optionally filtered by city.
    async fn list_libraries(
        &self,
        city: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Library>, ServiceError>;

    async fn get_library(&self, library_uid: LibraryUid) -> Result<Library, ServiceError>;

    /// Lists books stocked by a library. Books with no available copy are
    /// only included when `show_all` is set.
    async fn list_books(
        &self,
        library_uid: LibraryUid,
        page: PageRequest,
        show_all: bool,
    ) -> Result<Page<LibraryBook>, ServiceError>;

    async fn get_book(&self, book_uid: BookUid) -> Result<Book, ServiceError>;

    /// Takes one copy of the book out of the library.
    async fn take_book(&self, library_uid: LibraryUid, book_uid: BookUid)
    -> Result<(), ServiceError>;

    /// Puts one copy back and reports whether `condition` differs from the
    /// book's canonical condition.
    async fn return_book(
        &self,
        library_uid: LibraryUid,
        book_uid: BookUid,
        condition: BookCondition,
    ) -> Result<ViolationReport, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    libraries: Vec<Library>,
    books: HashMap<BookUid, Book>,
    stock: HashMap<(LibraryUid, BookUid), LibraryBook>,
    unavailable: bool,
    fail_on_lookup: bool,
    failing_returns: u32,
    take_calls: u32,
    return_calls: u32,
}

/// In-memory inventory service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryService {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryService {
    /// Creates a new in-memory inventory service.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_library(&self, library: Library) {
        self.state.write().unwrap().libraries.push(library);
    }

    /// Stocks `count` copies of `book` in a library.
    pub fn add_book(&self, library_uid: LibraryUid, book: Book, count: u32) {
        let mut state = self.state.write().unwrap();
        state.books.insert(book.book_uid, book.clone());
        state.stock.insert(
            (library_uid, book.book_uid),
            LibraryBook {
                book,
                available_count: count,
            },
        );
    }

    /// Returns the available-copy counter, if the library stocks the book.
    pub fn available_count(&self, library_uid: LibraryUid, book_uid: BookUid) -> Option<u32> {
        self.state
            .read()
            .unwrap()
            .stock
            .get(&(library_uid, book_uid))
            .map(|entry| entry.available_count)
    }

    /// Makes every call fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Makes `get_book` and `get_library` fail, leaving stock operations
    /// untouched.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state.write().unwrap().fail_on_lookup = fail;
    }

    /// Makes the next `count` return calls fail with a server error.
    pub fn fail_next_returns(&self, count: u32) {
        self.state.write().unwrap().failing_returns = count;
    }

    pub fn take_calls(&self) -> u32 {
        self.state.read().unwrap().take_calls
    }

    pub fn return_calls(&self) -> u32 {
        self.state.read().unwrap().return_calls
    }
}

#[async_trait]
impl InventoryService for InMemoryInventoryService {
    async fn list_libraries(
        &self,
        city: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Library>, ServiceError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(unavailable("library"));
        }

        let libraries: Vec<Library> = state
            .libraries
            .iter()
            .filter(|library| city.is_none_or(|city| library.city == city))
            .cloned()
            .collect();
        Ok(page.paginate(libraries))
    }

    async fn get_library(&self, library_uid: LibraryUid) -> Result<Library, ServiceError> {
        let state = self.state.read().unwrap();
        if state.unavailable || state.fail_on_lookup {
            return Err(unavailable("library"));
        }

        state
            .libraries
            .iter()
            .find(|library| library.library_uid == library_uid)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound("library not found".to_string()))
    }

    async fn list_books(
        &self,
        library_uid: LibraryUid,
        page: PageRequest,
        show_all: bool,
    ) -> Result<Page<LibraryBook>, ServiceError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(unavailable("library"));
        }

        let mut books: Vec<LibraryBook> = state
            .stock
            .iter()
            .filter(|((library, _), entry)| {
                *library == library_uid && (show_all || entry.is_available())
            })
            .map(|(_, entry)| entry.clone())
            .collect();
        books.sort_by(|a, b| a.book.name.cmp(&b.book.name));
        Ok(page.paginate(books))
    }

    async fn get_book(&self, book_uid: BookUid) -> Result<Book, ServiceError> {
        let state = self.state.read().unwrap();
        if state.unavailable || state.fail_on_lookup {
            return Err(unavailable("library"));
        }

        state
            .books
            .get(&book_uid)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound("book not found".to_string()))
    }

    async fn take_book(
        &self,
        library_uid: LibraryUid,
        book_uid: BookUid,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.take_calls += 1;
        if state.unavailable {
            return Err(unavailable("library"));
        }

        let entry = state
            .stock
            .get_mut(&(library_uid, book_uid))
            .ok_or(DomainError::BookNotStocked)?;
        entry.take()?;
        Ok(())
    }

    async fn return_book(
        &self,
        library_uid: LibraryUid,
        book_uid: BookUid,
        condition: BookCondition,
    ) -> Result<ViolationReport, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.return_calls += 1;
        if state.unavailable {
            return Err(unavailable("library"));
        }
        if state.failing_returns > 0 {
            state.failing_returns -= 1;
            return Err(server_error("library"));
        }

        let entry = state
            .stock
            .get_mut(&(library_uid, book_uid))
            .ok_or(DomainError::BookNotStocked)?;
        Ok(ViolationReport {
            violation: entry.restock(condition),
        })
    }
}
