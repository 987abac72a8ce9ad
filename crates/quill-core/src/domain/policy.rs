//! Ownership checks for mutating blog and comment operations.

use uuid::Uuid;

use crate::domain::{Blog, Comment};
use crate::error::DomainError;

/// Blog update and delete require the actor to be the author.
pub fn ensure_author(blog: &Blog, actor: Uuid) -> Result<(), DomainError> {
    if blog.author_id == actor {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// A comment may be removed by its author or by the blog's author.
pub fn can_remove_comment(blog: &Blog, comment: &Comment, actor: Uuid) -> bool {
    comment.user_id == actor || blog.author_id == actor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Blog;

    fn blog_by(author: Uuid) -> Blog {
        Blog::new(
            author,
            "Title".to_string(),
            "Content".to_string(),
            Vec::new(),
        )
    }

    #[test]
    fn only_the_author_may_mutate() {
        let author = Uuid::new_v4();
        let blog = blog_by(author);

        assert!(ensure_author(&blog, author).is_ok());
        assert!(matches!(
            ensure_author(&blog, Uuid::new_v4()),
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn comment_author_and_blog_author_may_remove() {
        let blog_author = Uuid::new_v4();
        let commenter = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let mut blog = blog_by(blog_author);
        let id = blog.add_comment(commenter, "hello").unwrap();
        let comment = blog.find_comment(id).unwrap().clone();

        assert!(can_remove_comment(&blog, &comment, commenter));
        assert!(can_remove_comment(&blog, &comment, blog_author));
        assert!(!can_remove_comment(&blog, &comment, stranger));
    }
}
