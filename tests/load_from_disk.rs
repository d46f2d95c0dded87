use besiege_mod_tool::{Mod, ModError, Resource};
use std::fs;
use std::path::Path;

const MOD_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Mod>
	<Name>Siege Pack</Name>
	<Author>Alice</Author>
	<Version>2.0.1</Version>
	<Description>Cannons, cubes and a horse</Description>
	<Debug>True</Debug>
	<MultiplayerCompatible>False</MultiplayerCompatible>
	<Assemblies>
		<Assembly path="SiegePack.dll" />
		<Assembly path="SiegePack.Helpers.dll" />
	</Assemblies>
	<Blocks>
		<Block path="blocks/cube.xml" />
		<Block path="blocks/cannon.xml" />
	</Blocks>
	<Entities>
		<Entity path="entities/horse.xml" />
	</Entities>
	<Keys></Keys>
	<Resources>
		<Texture name="a" path="old-a.png" />
		<Texture name="a" path="a.png" />
		<Sound name="b" path="b.wav" />
	</Resources>
	<ID>3f1b9c1e-42a0-4bb0-9d0e-5a6c7e8f9a0b</ID>
</Mod>
"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn mod_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Mod.xml", MOD_XML);
    write(
        dir.path(),
        "blocks/cube.xml",
        "<Block><Name>Cube</Name><ID>1</ID></Block>",
    );
    write(
        dir.path(),
        "blocks/cannon.xml",
        "<Block><Name>Cannon</Name><ID>2</ID></Block>",
    );
    write(
        dir.path(),
        "entities/horse.xml",
        "<Entity><Name>Horse</Name></Entity>",
    );
    dir
}

#[test]
fn loads_manifest_fields() {
    let dir = mod_dir();
    let mut m = Mod::new();
    m.load_from_disk(dir.path(), false).unwrap();

    assert!(m.is_loaded());
    assert!(!m.is_virtual());
    assert_eq!(m.name().unwrap(), "Siege Pack");
    assert_eq!(m.author().unwrap(), "Alice");
    assert_eq!(m.version().unwrap(), "2.0.1");
    assert_eq!(m.description().unwrap(), "Cannons, cubes and a horse");
    assert!(m.is_debug().unwrap());
    assert!(!m.is_multiplayer_compatible().unwrap());
    assert_eq!(m.id().unwrap(), "3f1b9c1e-42a0-4bb0-9d0e-5a6c7e8f9a0b");
    assert_eq!(
        m.assemblies().unwrap().to_vec(),
        vec!["SiegePack.dll", "SiegePack.Helpers.dll"]
    );
}

#[test]
fn reads_referenced_object_manifests_in_order() {
    let dir = mod_dir();
    let mut m = Mod::new();
    m.load_from_disk(dir.path(), false).unwrap();

    let blocks = m.blocks().unwrap();
    let names: Vec<_> = blocks
        .iter()
        .map(|block| block.document.child("Name").unwrap().text.as_deref().unwrap())
        .collect();
    assert_eq!(names, vec!["Cube", "Cannon"]);
    assert_eq!(blocks[0].path.as_deref(), Some("blocks/cube.xml"));

    let entities = m.entities().unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].document.name, "Entity");
}

#[test]
fn resources_are_keyed_by_name_with_last_write_winning() {
    let dir = mod_dir();
    let mut m = Mod::new();
    m.load_from_disk(dir.path(), false).unwrap();

    let resources = m.resources().unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources["a"], Resource::new("Texture", "a.png", "a"));
    assert_eq!(resources["b"], Resource::new("Sound", "b.wav", "b"));
}

#[test]
fn duplicate_names_collide_across_resource_types() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Mod.xml",
        r#"<Mod><Name>x</Name><Resources><Mesh name="tread" path="tread.obj"/><Texture name="tread" path="tread.png"/></Resources></Mod>"#,
    );
    let mut m = Mod::new();
    m.load_from_disk(dir.path(), false).unwrap();

    let resources = m.resources().unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources["tread"], Resource::new("Texture", "tread.png", "tread"));
}

#[test]
fn missing_sections_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Mod.xml", "<Mod><Name>Bare</Name></Mod>");
    let mut m = Mod::new();
    m.load_from_disk(dir.path(), false).unwrap();

    assert!(m.assemblies().unwrap().is_empty());
    assert!(m.blocks().unwrap().is_empty());
    assert!(m.entities().unwrap().is_empty());
    assert!(m.resources().unwrap().is_empty());
    assert!(m.triggers().unwrap().is_none());
}

#[test]
fn missing_manifest_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = Mod::new();
    let err = m.load_from_disk(dir.path(), false).unwrap_err();
    match err {
        ModError::ManifestNotFound { path, .. } => assert_eq!(path, dir.path().join("Mod.xml")),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!m.is_loaded() && !m.is_virtual());
}

#[test]
fn missing_block_file_is_not_found() {
    let dir = mod_dir();
    fs::remove_file(dir.path().join("blocks/cannon.xml")).unwrap();

    let mut m = Mod::new();
    let err = m.load_from_disk(dir.path(), false).unwrap_err();
    assert!(matches!(err, ModError::ManifestNotFound { .. }));
    assert!(matches!(m.blocks(), Err(ModError::Uninitialized { .. })));
}

#[test]
fn malformed_block_file_is_a_parse_error() {
    let dir = mod_dir();
    write(dir.path(), "blocks/cube.xml", "<Block><Name>Cube</Block>");

    let mut m = Mod::new();
    let err = m.load_from_disk(dir.path(), false).unwrap_err();
    match err {
        ModError::ManifestParse { path, .. } => {
            assert_eq!(path, dir.path().join("blocks/cube.xml"))
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn wrong_root_element_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Mod.xml", "<Block><Name>Cube</Name></Block>");

    let mut m = Mod::new();
    let err = m.load_from_disk(dir.path(), false).unwrap_err();
    assert!(matches!(err, ModError::ManifestFormat { .. }));
}

#[test]
fn plain_load_is_read_only() {
    let dir = mod_dir();
    let mut m = Mod::new();
    m.load_from_disk(dir.path(), false).unwrap();

    assert!(matches!(m.set_name("Other"), Err(ModError::ReadOnly { .. })));
    assert!(matches!(m.set_id("new"), Err(ModError::ReadOnly { .. })));
    assert!(matches!(
        m.load_from_disk(dir.path(), true),
        Err(ModError::AlreadyInitialized { .. })
    ));
    assert_eq!(m.name().unwrap(), "Siege Pack");
}

#[test]
fn clone_load_is_editable() {
    let dir = mod_dir();
    let mut m = Mod::new();
    m.load_from_disk(dir.path(), true).unwrap();

    assert!(m.is_virtual());
    assert!(!m.is_loaded());
    m.set_name("Siege Pack Deluxe").unwrap();
    m.set_multiplayer_compatible(true).unwrap();
    assert_eq!(m.name().unwrap(), "Siege Pack Deluxe");
    assert!(m.is_multiplayer_compatible().unwrap());

    // the directory on disk is untouched
    let on_disk = fs::read_to_string(dir.path().join("Mod.xml")).unwrap();
    assert!(on_disk.contains("<Name>Siege Pack</Name>"));
}
