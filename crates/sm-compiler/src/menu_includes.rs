use std::collections::BTreeMap;

use sm_core::{MarkupElement, MarkupNode, Menu, MenuItem, PropertyMap};

pub const MENU_INCLUDE_PREFIX: &str = "skinshortcuts-";

const CUSTOM_WIDGET_SLOTS: usize = 10;

/// Entry properties rendered as dedicated children rather than `<property>`.
const ITEM_FIELDS: &[&str] = &["label", "label2", "icon", "thumb", "visible", "action", "submenu"];

/// Builds, per root menu, `skinshortcuts-<menu>`, the combined
/// `skinshortcuts-<menu>-submenu` and any `customWidget` includes.
pub fn build_menu_includes(menus: &[Menu]) -> Vec<MarkupElement> {
    let builder = MenuIncludeBuilder {
        menus: menus.iter().map(|menu| (menu.name.as_str(), menu)).collect(),
    };

    let mut includes = Vec::new();
    for menu in menus.iter().filter(|menu| !menu.is_submenu) {
        includes.push(builder.menu_include(menu));
        includes.extend(builder.submenu_include(menu));
        includes.extend(builder.custom_widget_includes(menu));
    }
    log::debug!(
        "built {} menu includes from {} menus",
        includes.len(),
        menus.len()
    );
    includes
}

struct MenuIncludeBuilder<'a> {
    menus: BTreeMap<&'a str, &'a Menu>,
}

impl<'a> MenuIncludeBuilder<'a> {
    fn menu_include(&self, menu: &Menu) -> MarkupElement {
        let mut include = include_element(&menu.name);
        for (id, item) in (menu.first_id()..).zip(&menu.items) {
            if item.disabled {
                continue;
            }
            include = include.with_child(self.item_element(item, id, menu));
        }
        include
    }

    fn submenu_include(&self, parent: &Menu) -> Option<MarkupElement> {
        let mut include = include_element(&format!("{}-submenu", parent.name));
        let mut id = 1;
        for parent_item in parent.items.iter().filter(|item| !item.disabled) {
            let Some(submenu) = self.submenu_of(parent_item) else {
                continue;
            };
            for item in submenu.items.iter().filter(|item| !item.disabled) {
                let mut element = self.item_element(item, id, submenu);
                push_property(&mut element, "parent", &parent_item.name);
                if !parent.container.is_empty() {
                    gate_on_parent(&mut element, &parent.container, &parent_item.name);
                }
                include.children.push(MarkupNode::Element(element));
                id += 1;
            }
        }
        include.has_element_children().then_some(include)
    }

    fn custom_widget_includes(&self, parent: &Menu) -> Vec<MarkupElement> {
        let mut includes = Vec::new();
        for parent_item in parent.items.iter().filter(|item| !item.disabled) {
            for slot in 1..=CUSTOM_WIDGET_SLOTS {
                let (key, slot_name) = if slot == 1 {
                    ("customWidget".to_string(), String::new())
                } else {
                    (format!("customWidget.{slot}"), slot.to_string())
                };
                let Some(widget_menu) = parent_item
                    .properties
                    .get(&key)
                    .and_then(|name| self.menus.get(name.as_str()).copied())
                else {
                    continue;
                };
                if widget_menu.items.is_empty() {
                    continue;
                }

                let mut include =
                    include_element(&format!("{}-customwidget{slot_name}", parent_item.name));
                for (id, item) in (1..).zip(&widget_menu.items) {
                    if !item.disabled {
                        include = include.with_child(self.item_element(item, id, widget_menu));
                    }
                }
                includes.push(include);
            }
        }
        includes
    }

    fn submenu_of(&self, item: &MenuItem) -> Option<&'a Menu> {
        let name = match field(&item.properties, "submenu") {
            "" => item.name.as_str(),
            name => name,
        };
        self.menus.get(name).copied()
    }

    fn item_element(&self, item: &MenuItem, id: usize, menu: &Menu) -> MarkupElement {
        let properties = &item.properties;
        let base = if menu.control_type.is_empty() {
            MarkupElement::new("item")
        } else {
            MarkupElement::new("control").with_attr("type", menu.control_type.as_str())
        };
        let mut element = base
            .with_attr("id", id.to_string())
            .with_child(text_element("label", field(properties, "label")));

        for (name, required) in [("label2", false), ("icon", true), ("thumb", false)] {
            let value = field(properties, name);
            if required || !value.is_empty() {
                element = element.with_child(text_element(name, value));
            }
        }
        let action = field(properties, "action");
        if !action.is_empty() {
            element = element.with_child(text_element("onclick", action));
        }
        let visible = field(properties, "visible");
        if !visible.is_empty() {
            element = element.with_child(text_element("visible", visible));
        }

        if !menu.control_type.is_empty() {
            return element;
        }

        push_property(&mut element, "id", &id.to_string());
        push_property(&mut element, "name", &item.name);
        push_property(&mut element, "menu", &menu.name);
        push_property(&mut element, "path", action);
        if let Some(submenu) = self.submenu_of(item).filter(|submenu| !submenu.items.is_empty()) {
            push_property(&mut element, "submenuVisibility", &submenu.name);
            push_property(&mut element, "hasSubmenu", "True");
        }

        let mut merged = menu.defaults.clone();
        merged.extend(properties.clone());
        for (key, value) in merged
            .iter()
            .filter(|(key, _)| !ITEM_FIELDS.contains(&key.as_str()))
        {
            push_property(&mut element, key, value);
        }
        element
    }
}

fn field<'p>(properties: &'p PropertyMap, key: &str) -> &'p str {
    properties.get(key).map(String::as_str).unwrap_or_default()
}

fn include_element(name: &str) -> MarkupElement {
    MarkupElement::new("include").with_attr("name", format!("{MENU_INCLUDE_PREFIX}{name}"))
}

fn text_element(name: &str, value: &str) -> MarkupElement {
    let element = MarkupElement::new(name);
    if value.is_empty() {
        element
    } else {
        element.with_text(value)
    }
}

/// Empty values are never written.
fn push_property(element: &mut MarkupElement, name: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let property = MarkupElement::new("property")
        .with_attr("name", name)
        .with_text(value);
    element.children.push(MarkupNode::Element(property));
}

fn gate_on_parent(element: &mut MarkupElement, container: &str, parent: &str) {
    let gate = format!("String.IsEqual(Container({container}).ListItem.Property(name),{parent})");
    let existing = element.children.iter_mut().find_map(|child| match child {
        MarkupNode::Element(visible) if visible.name == "visible" => Some(visible),
        _ => None,
    });
    if let Some(visible) = existing {
        let combined = format!("[{}] + [{gate}]", visible.text_content());
        *visible = text_element("visible", &combined);
        return;
    }
    element
        .children
        .push(MarkupNode::Element(text_element("visible", &gate)));
}

#[cfg(test)]
mod menu_includes_tests {
    use super::*;
    use crate::schema_loader::load_menus;

    const MENUS: &str = r#"
<menus>
  <menu name="mainmenu" container="9000">
    <defaults><property name="widgetStyle">Panel</property></defaults>
    <item name="movies">
      <label>Movies</label>
      <icon>DefaultMovies.png</icon>
      <action>ActivateWindow(Videos)</action>
      <property name="widgetPath">videodb://movies/</property>
      <property name="customWidget.2">moviewidgets</property>
    </item>
    <item name="hidden" disabled="true"><label>Hidden</label></item>
    <item name="music">
      <label>Music</label>
      <submenu>musicsub</submenu>
    </item>
  </menu>
  <submenu name="movies">
    <item name="recent"><label>Recent</label><visible>Library.HasContent(Movies)</visible></item>
    <item name="off" disabled="true"><label>Off</label></item>
  </submenu>
  <submenu name="musicsub">
    <item name="albums"><label>Albums</label></item>
  </submenu>
  <submenu name="moviewidgets">
    <item name="inprogress"><label>In progress</label></item>
  </submenu>
</menus>
"#;

    fn property(element: &MarkupElement, name: &str) -> Option<String> {
        element
            .element_children()
            .find(|child| child.name == "property" && child.attr("name") == Some(name))
            .map(MarkupElement::text_content)
    }

    fn names(includes: &[MarkupElement]) -> Vec<&str> {
        includes
            .iter()
            .map(|include| include.attr("name").unwrap_or_default())
            .collect()
    }

    #[test]
    fn root_menus_emit_menu_submenu_and_custom_widget_includes() {
        let menus = load_menus(MENUS).expect("menus should load");
        let includes = build_menu_includes(&menus);
        assert_eq!(
            names(&includes),
            vec![
                "skinshortcuts-mainmenu",
                "skinshortcuts-mainmenu-submenu",
                "skinshortcuts-movies-customwidget2",
            ]
        );
    }

    #[test]
    fn disabled_items_are_skipped_but_keep_their_id() {
        let menus = load_menus(MENUS).expect("menus should load");
        let includes = build_menu_includes(&menus);
        let items = includes[0].element_children().collect::<Vec<_>>();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "item");
        assert_eq!(items[0].attr("id"), Some("1"));
        assert_eq!(items[1].attr("id"), Some("3"));

        let movies = items[0];
        assert_eq!(
            movies.first_child("label").map(MarkupElement::text_content),
            Some("Movies".to_string())
        );
        assert_eq!(
            movies.first_child("onclick").map(MarkupElement::text_content),
            Some("ActivateWindow(Videos)".to_string())
        );
        assert!(movies.first_child("thumb").is_none());
        assert_eq!(property(movies, "path"), Some("ActivateWindow(Videos)".to_string()));
        assert_eq!(property(movies, "menu"), Some("mainmenu".to_string()));
        assert_eq!(property(movies, "widgetStyle"), Some("Panel".to_string()));
        assert_eq!(property(movies, "widgetPath"), Some("videodb://movies/".to_string()));
        assert_eq!(property(movies, "submenuVisibility"), Some("movies".to_string()));
        assert_eq!(property(movies, "hasSubmenu"), Some("True".to_string()));
        assert_eq!(property(movies, "label"), None);

        let music = items[1];
        assert_eq!(property(music, "submenuVisibility"), Some("musicsub".to_string()));
        assert_eq!(property(music, "path"), None);
        assert_eq!(property(music, "submenu"), None);
    }

    #[test]
    fn submenu_include_numbers_globally_and_gates_on_parent() {
        let menus = load_menus(MENUS).expect("menus should load");
        let includes = build_menu_includes(&menus);
        let items = includes[1].element_children().collect::<Vec<_>>();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].attr("id"), Some("1"));
        assert_eq!(items[1].attr("id"), Some("2"));
        assert_eq!(property(items[0], "parent"), Some("movies".to_string()));
        assert_eq!(property(items[1], "parent"), Some("music".to_string()));
        assert_eq!(
            items[0].first_child("visible").map(MarkupElement::text_content),
            Some(
                "[Library.HasContent(Movies)] + [String.IsEqual(Container(9000).ListItem.Property(name),movies)]"
                    .to_string()
            )
        );
        assert_eq!(
            items[1].first_child("visible").map(MarkupElement::text_content),
            Some("String.IsEqual(Container(9000).ListItem.Property(name),music)".to_string())
        );
    }

    #[test]
    fn control_menus_use_start_id_and_skip_properties() {
        let menus = load_menus(
            r#"
<menus>
  <menu name="shortcuts" controltype="button" startid="40">
    <item name="a"><label>A</label></item>
    <item name="b"><label>B</label><thumb>b.png</thumb></item>
  </menu>
</menus>
"#,
        )
        .expect("menus should load");
        let includes = build_menu_includes(&menus);
        assert_eq!(names(&includes), vec!["skinshortcuts-shortcuts"]);

        let controls = includes[0].element_children().collect::<Vec<_>>();
        assert_eq!(controls[0].name, "control");
        assert_eq!(controls[0].attr("type"), Some("button"));
        assert_eq!(controls[0].attr("id"), Some("40"));
        assert_eq!(controls[1].attr("id"), Some("41"));
        assert!(controls[0].first_child("icon").is_some());
        assert!(controls[0].first_child("property").is_none());
        assert_eq!(
            controls[1].first_child("thumb").map(MarkupElement::text_content),
            Some("b.png".to_string())
        );
    }

    #[test]
    fn submenus_alone_produce_no_includes() {
        let menus = load_menus(
            r#"<menus><menu name="main"><item name="x"/></menu><submenu name="other"><item name="y"/></submenu></menus>"#,
        )
        .expect("menus should load");
        let includes = build_menu_includes(&menus);
        assert_eq!(names(&includes), vec!["skinshortcuts-main"]);
    }
}
