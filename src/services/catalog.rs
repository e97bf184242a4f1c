//! Catalog management service: books, authors and genres

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{CreateAuthor, UpdateAuthor},
        book::{CreateBook, UpdateBook},
        genre::{CreateGenre, UpdateGenre},
        Author, Book, Genre, PageQuery, RecordFilter,
    },
    repository::{BookAvailability, Repository},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // ---- Books ----

    pub async fn list_books(
        &self,
        filter: RecordFilter,
        page: &PageQuery,
    ) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.list(filter, page).await
    }

    pub async fn get_book(&self, book_reference: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_reference(book_reference).await
    }

    /// Create a book after checking its authors and genres exist
    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        if self.repository.books.find_by_title(&data.title).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A book titled '{}' already exists",
                data.title
            )));
        }

        self.check_references(&data.author_references, &data.genre_references)
            .await?;

        let book = Book::new(data)?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!("Book {} created: {}", created.book_reference, created.title);
        Ok(created)
    }

    pub async fn update_book(&self, book_reference: Uuid, data: UpdateBook) -> AppResult<Book> {
        let mut book = self.repository.books.get_by_reference(book_reference).await?;

        if let Some(ref title) = data.title {
            if let Some(existing) = self.repository.books.find_by_title(title).await? {
                if existing.book_reference != book_reference {
                    return Err(AppError::Conflict(format!(
                        "A book titled '{}' already exists",
                        title
                    )));
                }
            }
        }

        self.check_references(
            data.author_references.as_deref().unwrap_or_default(),
            data.genre_references.as_deref().unwrap_or_default(),
        )
        .await?;

        book.apply(data)?;
        self.repository.books.update(&book).await
    }

    pub async fn delete_book(&self, book_reference: Uuid) -> AppResult<()> {
        self.repository.books.delete(book_reference).await?;
        tracing::info!("Book {} deleted", book_reference);
        Ok(())
    }

    pub async fn soft_delete_book(&self, book_reference: Uuid) -> AppResult<()> {
        self.repository.books.soft_delete(book_reference).await
    }

    async fn check_references(&self, authors: &[Uuid], genres: &[Uuid]) -> AppResult<()> {
        for author_reference in authors {
            self.repository
                .authors
                .get_by_reference(*author_reference)
                .await?;
        }
        for genre_reference in genres {
            self.repository
                .genres
                .get_by_reference(*genre_reference)
                .await?;
        }
        Ok(())
    }

    // ---- Authors ----

    pub async fn list_authors(&self, page: &PageQuery) -> AppResult<(Vec<Author>, i64)> {
        self.repository.authors.list(page).await
    }

    pub async fn get_author(&self, author_reference: Uuid) -> AppResult<Author> {
        self.repository.authors.get_by_reference(author_reference).await
    }

    /// Books written by an author
    pub async fn list_author_books(
        &self,
        author_reference: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Book>, i64)> {
        self.repository.authors.get_by_reference(author_reference).await?;
        self.repository.books.list_by_author(author_reference, page).await
    }

    pub async fn create_author(&self, data: CreateAuthor) -> AppResult<Author> {
        if self
            .repository
            .authors
            .name_exists(&data.first_name, &data.last_name)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Author {} {} already exists",
                data.first_name, data.last_name
            )));
        }
        self.repository.authors.create(&Author::new(data)).await
    }

    pub async fn update_author(
        &self,
        author_reference: Uuid,
        data: UpdateAuthor,
    ) -> AppResult<Author> {
        let mut author = self.repository.authors.get_by_reference(author_reference).await?;
        author.apply(data);
        self.repository.authors.update(&author).await
    }

    pub async fn delete_author(&self, author_reference: Uuid) -> AppResult<()> {
        self.repository.authors.delete(author_reference).await
    }

    pub async fn soft_delete_author(&self, author_reference: Uuid) -> AppResult<()> {
        self.repository.authors.soft_delete(author_reference).await
    }

    // ---- Genres ----

    pub async fn list_genres(&self, page: &PageQuery) -> AppResult<(Vec<Genre>, i64)> {
        self.repository.genres.list(page).await
    }

    pub async fn get_genre(&self, genre_reference: Uuid) -> AppResult<Genre> {
        self.repository.genres.get_by_reference(genre_reference).await
    }

    /// Books filed under a genre
    pub async fn list_genre_books(
        &self,
        genre_reference: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Book>, i64)> {
        self.repository.genres.get_by_reference(genre_reference).await?;
        self.repository.books.list_by_genre(genre_reference, page).await
    }

    pub async fn create_genre(&self, data: CreateGenre) -> AppResult<Genre> {
        if self.repository.genres.name_exists(&data.name).await? {
            return Err(AppError::Conflict(format!(
                "Genre '{}' already exists",
                data.name
            )));
        }
        self.repository.genres.create(&Genre::new(data)).await
    }

    pub async fn update_genre(&self, genre_reference: Uuid, data: UpdateGenre) -> AppResult<Genre> {
        let mut genre = self.repository.genres.get_by_reference(genre_reference).await?;
        genre.apply(data);
        self.repository.genres.update(&genre).await
    }

    pub async fn delete_genre(&self, genre_reference: Uuid) -> AppResult<()> {
        self.repository.genres.delete(genre_reference).await
    }
}
