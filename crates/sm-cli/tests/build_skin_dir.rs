use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const TEMPLATES: &str = r#"<templates>
  <expressions>
    <expression name="HasWidget">widgetPath</expression>
  </expressions>
  <presets>
    <preset name="artwork">
      <values condition="widgetArt=Poster" aspect="stretch"/>
      <values aspect="scale"/>
    </preset>
  </presets>
  <template include="widget">
    <condition>$EXP[HasWidget]</condition>
    <output include="widget1" idprefix="801"/>
    <output include="widget2" idprefix="802" suffix=".2"/>
    <property name="content" from="widgetPath"/>
    <preset name="artwork"/>
    <controls>
      <control type="list" id="$PROPERTY[id]">
        <content>$PROPERTY[content]</content>
        <aspect>$PROPERTY[aspect]</aspect>
      </control>
    </controls>
  </template>
</templates>"#;

const MENUS: &str = r#"<menus>
  <menu name="mainmenu">
    <item name="movies">
      <property name="widgetPath">videodb://movies/</property>
      <property name="widgetPath.2">videodb://recent/</property>
      <property name="widgetArt.2">Poster</property>
    </item>
  </menu>
</menus>"#;

fn temp_skin_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("skinmenu-it-{}-{}", name, nanos))
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent should be created");
    }
    fs::write(path, content).expect("file should be written");
}

#[test]
fn build_writes_includes_for_every_output() {
    let bin = env!("CARGO_BIN_EXE_skinmenu");
    let skin_dir = temp_skin_dir("outputs");
    write_file(&skin_dir.join("shortcuts").join("templates.xml"), TEMPLATES);
    write_file(&skin_dir.join("shortcuts").join("menus.xml"), MENUS);

    let output = Command::new(bin)
        .arg("build")
        .arg("--skin-dir")
        .arg(&skin_dir)
        .output()
        .expect("cli should execute");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "build failed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("RESULT:OK"));
    assert!(stdout.contains("INCLUDES:3"));
    assert!(stdout.contains("DIAGNOSTICS:0"));

    let written = fs::read_to_string(skin_dir.join("script-skinshortcuts-includes.xml"))
        .expect("includes file should exist");
    assert!(written.contains("<include name=\"skinshortcuts-mainmenu\">"));
    assert!(written.contains("<property name=\"name\">movies</property>"));
    assert!(written.contains("<control id=\"8011\" type=\"list\">"));
    assert!(written.contains("<content>videodb://movies/</content>"));
    assert!(written.contains("<aspect>scale</aspect>"));
    assert!(written.contains("<control id=\"8021\" type=\"list\">"));
    assert!(written.contains("<content>videodb://recent/</content>"));
    assert!(written.contains("<aspect>stretch</aspect>"));
}

#[test]
fn build_reports_missing_templates_as_error() {
    let bin = env!("CARGO_BIN_EXE_skinmenu");
    let skin_dir = temp_skin_dir("missing-templates");
    write_file(&skin_dir.join("menus.xml"), MENUS);

    let output = Command::new(bin)
        .arg("build")
        .arg("--skin-dir")
        .arg(&skin_dir)
        .output()
        .expect("cli should execute");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:API_TEMPLATES_NOT_FOUND"));
}
