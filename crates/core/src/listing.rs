//! Filtering and ordering for menu and roster listings.
//!
//! The Postgres store translates these into SQL; the memory store evaluates
//! them directly through [`MenuQuery::matches`] and [`MenuOrdering::compare`].
//! Both sort ties by id so pages are stable.

use core::cmp::Ordering;
use core::str::FromStr;

use rust_decimal::Decimal;

/// Errors from an unrecognized `ordering` parameter.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot order by {0:?}")]
pub struct OrderingError(pub String);

/// Ascending or descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Split a leading `-` off a field name.
    fn split(s: &str) -> (Self, &str) {
        s.strip_prefix('-')
            .map_or((Self::Asc, s), |rest| (Self::Desc, rest))
    }

    /// Apply this direction to an ascending comparison.
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }

    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Menu item field a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuField {
    /// Item title.
    Title,
    /// Item price.
    Price,
    /// Title of the item's category.
    CategoryTitle,
}

/// Sort order for menu listings, parsed from `title`, `-price`,
/// `category__title` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuOrdering {
    /// Field to sort by.
    pub field: MenuField,
    /// Direction.
    pub direction: SortDirection,
}

/// The sortable attributes of one menu item.
#[derive(Debug, Clone, Copy)]
pub struct MenuSortKey<'a> {
    /// Item title.
    pub title: &'a str,
    /// Item price.
    pub price: Decimal,
    /// Title of the item's category.
    pub category_title: &'a str,
}

impl MenuOrdering {
    /// Compare two items under this ordering.
    #[must_use]
    pub fn compare(&self, a: &MenuSortKey<'_>, b: &MenuSortKey<'_>) -> Ordering {
        let ascending = match self.field {
            MenuField::Title => a.title.cmp(b.title),
            MenuField::Price => a.price.cmp(&b.price),
            MenuField::CategoryTitle => a.category_title.cmp(b.category_title),
        };
        self.direction.apply(ascending)
    }
}

impl FromStr for MenuOrdering {
    type Err = OrderingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (direction, name) = SortDirection::split(s.trim());
        let field = match name {
            "title" => MenuField::Title,
            "price" => MenuField::Price,
            "category__title" => MenuField::CategoryTitle,
            _ => return Err(OrderingError(s.to_owned())),
        };
        Ok(Self { field, direction })
    }
}

/// Filters for the menu item listing.
///
/// All present filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuQuery {
    /// Case-insensitive substring of the category title.
    pub category: Option<String>,
    /// Exact item title.
    pub title: Option<String>,
    /// Featured flag.
    pub featured: Option<bool>,
    /// Whitespace-separated terms; each must appear (case-insensitively) in
    /// the item title or the category title.
    pub search: Option<String>,
    /// Sort order; `None` sorts by id.
    pub ordering: Option<MenuOrdering>,
}

fn icontains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl MenuQuery {
    /// The individual search terms, if a search was requested.
    #[must_use]
    pub fn search_terms(&self) -> Vec<&str> {
        self.search
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Whether an item with these attributes passes every filter.
    #[must_use]
    pub fn matches(&self, title: &str, category_title: &str, featured: bool) -> bool {
        if let Some(category) = &self.category
            && !icontains(category_title, category)
        {
            return false;
        }
        if let Some(expected) = &self.title
            && title != expected
        {
            return false;
        }
        if let Some(expected) = self.featured
            && featured != expected
        {
            return false;
        }
        self.search_terms()
            .iter()
            .all(|term| icontains(title, term) || icontains(category_title, term))
    }
}

/// Sort order for group rosters: `username` or `-username`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RosterOrdering(pub SortDirection);

impl FromStr for RosterOrdering {
    type Err = OrderingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match SortDirection::split(s.trim()) {
            (direction, "username") => Ok(Self(direction)),
            _ => Err(OrderingError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key<'a>(title: &'a str, price: i64, category_title: &'a str) -> MenuSortKey<'a> {
        MenuSortKey {
            title,
            price: Decimal::new(price, 2),
            category_title,
        }
    }

    #[test]
    fn test_parse_menu_ordering() {
        let o: MenuOrdering = "-price".parse().unwrap();
        assert_eq!(o.field, MenuField::Price);
        assert_eq!(o.direction, SortDirection::Desc);

        let o: MenuOrdering = "category__title".parse().unwrap();
        assert_eq!(o.field, MenuField::CategoryTitle);
        assert_eq!(o.direction, SortDirection::Asc);

        assert!("featured".parse::<MenuOrdering>().is_err());
        assert!("--title".parse::<MenuOrdering>().is_err());
    }

    #[test]
    fn test_compare() {
        let pasta = key("Beef Pasta", 600, "Main");
        let negroni = key("Negroni", 500, "Drink");

        let by_price: MenuOrdering = "price".parse().unwrap();
        assert_eq!(by_price.compare(&pasta, &negroni), Ordering::Greater);

        let by_title_desc: MenuOrdering = "-title".parse().unwrap();
        assert_eq!(by_title_desc.compare(&pasta, &negroni), Ordering::Greater);

        let by_category: MenuOrdering = "category__title".parse().unwrap();
        assert_eq!(by_category.compare(&pasta, &negroni), Ordering::Greater);
    }

    #[test]
    fn test_category_filter_is_case_insensitive_substring() {
        let q = MenuQuery {
            category: Some("APPET".into()),
            ..MenuQuery::default()
        };
        assert!(q.matches("Greek Salad", "Appetizer", false));
        assert!(!q.matches("Beef Pasta", "Main", false));
    }

    #[test]
    fn test_title_and_featured_filters() {
        let q = MenuQuery {
            title: Some("Negroni".into()),
            featured: Some(true),
            ..MenuQuery::default()
        };
        assert!(q.matches("Negroni", "Drink", true));
        assert!(!q.matches("Negroni", "Drink", false));
        assert!(!q.matches("negroni", "Drink", true));
    }

    #[test]
    fn test_search_covers_title_and_category() {
        let q = MenuQuery {
            search: Some("drink bel".into()),
            ..MenuQuery::default()
        };
        assert!(q.matches("Bellini", "Drink", false));
        assert!(!q.matches("Negroni", "Drink", false));
        assert!(MenuQuery::default().matches("Anything", "Any", false));
    }

    #[test]
    fn test_roster_ordering() {
        assert_eq!(
            "-username".parse::<RosterOrdering>().unwrap(),
            RosterOrdering(SortDirection::Desc)
        );
        assert!("id".parse::<RosterOrdering>().is_err());
    }
}
