//! Role, assertion, region and phrase tables.

use super::command::AssertBehavior;

/// Every ARIA role a command may target
pub const ARIA_ROLES: &[&str] = &[
    "alert",
    "alertdialog",
    "application",
    "article",
    "banner",
    "blockquote",
    "button",
    "caption",
    "cell",
    "checkbox",
    "code",
    "columnheader",
    "combobox",
    "complementary",
    "contentinfo",
    "definition",
    "deletion",
    "dialog",
    "directory",
    "document",
    "emphasis",
    "feed",
    "figure",
    "form",
    "generic",
    "grid",
    "gridcell",
    "group",
    "heading",
    "img",
    "insertion",
    "link",
    "list",
    "listbox",
    "listitem",
    "log",
    "main",
    "marquee",
    "math",
    "meter",
    "menu",
    "menubar",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "navigation",
    "none",
    "note",
    "option",
    "paragraph",
    "presentation",
    "progressbar",
    "radio",
    "radiogroup",
    "region",
    "row",
    "rowgroup",
    "rowheader",
    "scrollbar",
    "search",
    "searchbox",
    "separator",
    "slider",
    "spinbutton",
    "status",
    "strong",
    "subscript",
    "superscript",
    "switch",
    "tab",
    "table",
    "tablist",
    "tabpanel",
    "term",
    "textbox",
    "time",
    "timer",
    "toolbar",
    "tooltip",
    "tree",
    "treegrid",
    "treeitem",
];

/// Informal element names mapped to ARIA roles
const ROLE_ALIASES: &[(&str, &str)] = &[
    ("input", "textbox"),
    ("textfield", "textbox"),
    ("field", "textbox"),
    ("textarea", "textbox"),
    ("element", "generic"),
    ("text", "generic"),
    ("div", "generic"),
    ("span", "generic"),
    ("dropdown", "combobox"),
    ("select", "combobox"),
    ("image", "img"),
    ("picture", "img"),
    ("icon", "img"),
    ("title", "heading"),
    ("header", "heading"),
    ("anchor", "link"),
    ("hyperlink", "link"),
    ("toggle", "switch"),
    ("range", "slider"),
    ("item", "listitem"),
    ("modal", "dialog"),
    ("popup", "dialog"),
    ("section", "region"),
    ("nav", "navigation"),
    ("navbar", "navigation"),
];

/// Resolve a written element type to a canonical ARIA role.
///
/// Returns `None` when the word is neither a role nor a known alias.
#[must_use]
pub fn canonical_role(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    ROLE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, role)| *role)
        .or_else(|| ARIA_ROLES.iter().find(|role| **role == lower).copied())
}

/// Whether `role` is a canonical ARIA role
#[must_use]
pub fn is_aria_role(role: &str) -> bool {
    ARIA_ROLES.contains(&role)
}

/// Roles whose readable content is a form value rather than text
pub const INPUT_ROLES: &[&str] = &["textbox", "searchbox", "combobox", "spinbutton", "slider"];

const ASSERT_ALIASES: &[(&str, AssertBehavior)] = &[
    ("have", AssertBehavior::Exact),
    ("has", AssertBehavior::Exact),
    ("be", AssertBehavior::Exact),
    ("is", AssertBehavior::Exact),
    ("equal", AssertBehavior::Exact),
    ("equals", AssertBehavior::Exact),
    ("exact", AssertBehavior::Exact),
    ("exactly", AssertBehavior::Exact),
    ("contain", AssertBehavior::Contain),
    ("contains", AssertBehavior::Contain),
    ("include", AssertBehavior::Contain),
    ("includes", AssertBehavior::Contain),
    ("match", AssertBehavior::Match),
    ("matches", AssertBehavior::Match),
    ("exist", AssertBehavior::Exist),
    ("exists", AssertBehavior::Exist),
    ("appear", AssertBehavior::Exist),
];

/// Normalize an assertion verb
#[must_use]
pub fn assert_behavior(word: &str) -> Option<AssertBehavior> {
    let lower = word.to_lowercase();
    ASSERT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, behavior)| *behavior)
}

/// Region scope names that resolve to landmark elements
pub const REGIONS: &[&str] = &["nav", "main", "header", "footer", "aside"];

const REGION_ALIASES: &[(&str, &str)] = &[
    ("nav", "nav"),
    ("navbar", "nav"),
    ("sidebar", "nav"),
    ("navigation", "nav"),
    ("menu", "nav"),
    ("main", "main"),
    ("content", "main"),
    ("header", "header"),
    ("banner", "header"),
    ("footer", "footer"),
    ("aside", "aside"),
];

/// Collapse an informal region name (`navbar`) to its canonical form
#[must_use]
pub fn canonical_region(word: &str) -> Option<&'static str> {
    REGION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == word)
        .map(|(_, region)| *region)
}

/// Two-word phrases replaced by a single token before field assignment
pub const PHRASES: &[(&str, &str, &str)] = &[
    ("text", "box", "textbox"),
    ("text", "field", "textbox"),
    ("text", "area", "textbox"),
    ("input", "field", "textbox"),
    ("check", "box", "checkbox"),
    ("radio", "button", "radio"),
    ("drop", "down", "combobox"),
    ("menu", "item", "menuitem"),
    ("nav", "bar", "navbar"),
    ("side", "bar", "sidebar"),
    ("search", "box", "searchbox"),
    ("list", "item", "listitem"),
    ("tab", "panel", "tabpanel"),
    ("progress", "bar", "progressbar"),
    ("spin", "button", "spinbutton"),
];

/// Look up the replacement for `head continuation`
#[must_use]
pub fn phrase(head: &str, continuation: &str) -> Option<&'static str> {
    let head = head.to_lowercase();
    let continuation = continuation.to_lowercase();
    PHRASES
        .iter()
        .find(|(h, c, _)| *h == head && *c == continuation)
        .map(|(_, _, replacement)| *replacement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_role_aliases() {
        assert_eq!(canonical_role("input"), Some("textbox"));
        assert_eq!(canonical_role("Element"), Some("generic"));
        assert_eq!(canonical_role("button"), Some("button"));
        assert_eq!(canonical_role("image"), Some("img"));
        assert_eq!(canonical_role("gizmo"), None);
    }

    #[test]
    fn test_every_alias_targets_a_role() {
        for (_, role) in ROLE_ALIASES {
            assert!(is_aria_role(role), "{role} is not an ARIA role");
        }
    }

    #[test]
    fn test_assert_aliases() {
        assert_eq!(assert_behavior("have"), Some(AssertBehavior::Exact));
        assert_eq!(assert_behavior("Contains"), Some(AssertBehavior::Contain));
        assert_eq!(assert_behavior("match"), Some(AssertBehavior::Match));
        assert_eq!(assert_behavior("exist"), Some(AssertBehavior::Exist));
        assert_eq!(assert_behavior("smell"), None);
    }

    #[test]
    fn test_region_aliases() {
        assert_eq!(canonical_region("navbar"), Some("nav"));
        assert_eq!(canonical_region("sidebar"), Some("nav"));
        assert_eq!(canonical_region("footer"), Some("footer"));
        assert_eq!(canonical_region("User"), None);
        for (_, region) in REGION_ALIASES {
            assert!(REGIONS.contains(region));
        }
    }

    #[test]
    fn test_phrases() {
        assert_eq!(phrase("text", "box"), Some("textbox"));
        assert_eq!(phrase("Check", "Box"), Some("checkbox"));
        assert_eq!(phrase("text", "message"), None);
    }
}
