use std::collections::BTreeMap;
use std::path::Path;

use sm_compiler::{
    load_menus, load_property_schema, load_template_schema, render_document, BuildOutput,
    TemplateBuilder,
};
use sm_core::{MarkupElement, PropertySchema, SkinMenuError};

pub use sm_compiler::BuildOptions;

pub const TEMPLATES_FILE: &str = "templates.xml";
pub const PROPERTIES_FILE: &str = "properties.xml";
pub const MENUS_FILE: &str = "menus.xml";

#[derive(Debug, Clone, PartialEq)]
pub struct BuildIncludesResult {
    pub document: String,
    pub root: MarkupElement,
    pub diagnostics: Vec<SkinMenuError>,
}

/// Builds the includes document from skin files keyed by relative path.
/// Files are matched by file name; `properties.xml` is optional.
pub fn build_includes_from_xml_map(
    files: &BTreeMap<String, String>,
    options: &BuildOptions,
) -> Result<BuildIncludesResult, SkinMenuError> {
    let templates_source = find_file(files, TEMPLATES_FILE).ok_or_else(|| {
        SkinMenuError::new(
            "API_TEMPLATES_NOT_FOUND",
            format!("Expected a \"{TEMPLATES_FILE}\" file in the skin sources."),
        )
    })?;
    let menus_source = find_file(files, MENUS_FILE).ok_or_else(|| {
        SkinMenuError::new(
            "API_MENUS_NOT_FOUND",
            format!("Expected a \"{MENUS_FILE}\" file in the skin sources."),
        )
    })?;

    let schema = load_template_schema(templates_source)?;
    let property_schema = match find_file(files, PROPERTIES_FILE) {
        Some(source) => load_property_schema(source)?,
        None => PropertySchema::default(),
    };
    let menus = load_menus(menus_source)?;
    log::debug!(
        "loaded {} templates and {} menus",
        schema.templates.len(),
        menus.len()
    );

    let BuildOutput { root, diagnostics } =
        TemplateBuilder::new(&schema, &property_schema, &menus, options).build_document();

    Ok(BuildIncludesResult {
        document: render_document(&root),
        root,
        diagnostics,
    })
}

fn find_file<'a>(files: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    files
        .iter()
        .find(|(path, _)| Path::new(path).file_name().is_some_and(|file| file == name))
        .map(|(_, source)| source.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    const TEMPLATES: &str = r#"<templates>
  <template include="widget" idprefix="80">
    <condition>widgetPath</condition>
    <controls><control id="$PROPERTY[id]"><content>$PROPERTY[widgetPath]</content></control></controls>
  </template>
</templates>"#;

    const MENUS: &str = r#"<menus>
  <menu name="mainmenu">
    <item name="movies"><property name="widgetPath">videodb://movies/</property></item>
    <item name="music"/>
  </menu>
</menus>"#;

    #[test]
    fn build_includes_renders_document() {
        let files = map(&[
            ("shortcuts/templates.xml", TEMPLATES),
            ("shortcuts/menus.xml", MENUS),
        ]);
        let result = build_includes_from_xml_map(&files, &BuildOptions::default())
            .expect("build should pass");
        assert!(result.diagnostics.is_empty());
        assert!(result
            .document
            .contains("<control id=\"801\">\n\t\t\t<content>videodb://movies/</content>"));
        let names = result
            .root
            .element_children()
            .filter_map(|child| child.attr("name"))
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["skinshortcuts-mainmenu", "skinshortcuts-template-widget"]);
        assert!(result
            .document
            .contains("<property name=\"widgetPath\">videodb://movies/</property>"));
    }

    #[test]
    fn build_includes_applies_fallbacks_when_present() {
        let templates = r#"<templates>
  <template include="widget">
    <controls><art>$PROPERTY[widgetArt]</art></controls>
  </template>
</templates>"#;
        let properties = r#"<properties>
  <fallbacks><fallback property="widgetArt"><default>Poster</default></fallback></fallbacks>
</properties>"#;
        let files = map(&[
            ("templates.xml", templates),
            ("properties.xml", properties),
            ("menus.xml", MENUS),
        ]);
        let result = build_includes_from_xml_map(&files, &BuildOptions::default())
            .expect("build should pass");
        assert!(result.document.contains("<art>Poster</art>"));
    }

    #[test]
    fn build_includes_requires_templates() {
        let files = map(&[("menus.xml", MENUS)]);
        let error = build_includes_from_xml_map(&files, &BuildOptions::default())
            .expect_err("missing templates should fail");
        assert_eq!(error.code, "API_TEMPLATES_NOT_FOUND");
    }

    #[test]
    fn build_includes_requires_menus() {
        let files = map(&[("templates.xml", TEMPLATES)]);
        let error = build_includes_from_xml_map(&files, &BuildOptions::default())
            .expect_err("missing menus should fail");
        assert_eq!(error.code, "API_MENUS_NOT_FOUND");
    }

    #[test]
    fn build_includes_propagates_loader_errors() {
        let files = map(&[("templates.xml", "<menus/>"), ("menus.xml", MENUS)]);
        let error = build_includes_from_xml_map(&files, &BuildOptions::default())
            .expect_err("wrong root should fail");
        assert_eq!(error.code, "XML_ROOT_INVALID");
    }
}
