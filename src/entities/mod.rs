pub mod keyword;
pub mod location;
pub mod page_content;

pub use keyword::Entity as SeoKeyword;
pub use location::Entity as SeoLocation;
pub use page_content::Entity as SeoPageCache;
