use besiege_mod_tool::{Mod, ModError};
use std::fs;

#[test]
fn created_mod_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();

    let mut created = Mod::new();
    created.create_new("MyMod", "Alice").unwrap();
    created.set_description("Adds a bigger wheel").unwrap();
    created.set_debug(false).unwrap();
    created.add_assembly("MyMod.dll").unwrap();
    created.save_to_disk(dir.path()).unwrap();

    let xml = fs::read_to_string(dir.path().join("Mod.xml")).unwrap();
    assert!(xml.contains("<Name>MyMod</Name>"));
    assert!(xml.contains("<Assembly path=\"MyMod.dll\"/>"));
    assert!(xml.contains("<Keys/>"));

    let mut loaded = Mod::new();
    loaded.load_from_disk(dir.path(), false).unwrap();
    assert_eq!(loaded.name().unwrap(), "MyMod");
    assert_eq!(loaded.author().unwrap(), "Alice");
    assert_eq!(loaded.version().unwrap(), "0.0.1");
    assert_eq!(loaded.description().unwrap(), "Adds a bigger wheel");
    assert!(!loaded.is_debug().unwrap());
    assert!(loaded.is_multiplayer_compatible().unwrap());
    assert_eq!(loaded.id().unwrap(), "");
    assert_eq!(loaded.assemblies().unwrap().to_vec(), vec!["MyMod.dll"]);

    let field_names = |m: &Mod| {
        m.manifest()
            .unwrap()
            .iter()
            .map(|(name, _)| name.to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(field_names(&loaded), field_names(&created));
}

#[test]
fn cloned_mod_is_written_with_its_blocks() {
    let source = tempfile::tempdir().unwrap();
    fs::create_dir_all(source.path().join("Blocks")).unwrap();
    fs::write(
        source.path().join("Mod.xml"),
        r#"<Mod>
            <Name>Cube</Name>
            <Author>Bob</Author>
            <Version>1.0.0</Version>
            <Blocks><Block path="Blocks/Cube.xml"/></Blocks>
            <Resources><Mesh name="cube" path="cube.obj"/></Resources>
        </Mod>"#,
    )
    .unwrap();
    fs::write(
        source.path().join("Blocks/Cube.xml"),
        "<Block><Name>Cube</Name><Mass>0.3</Mass></Block>",
    )
    .unwrap();

    let mut m = Mod::new();
    m.load_from_disk(source.path(), true).unwrap();
    m.set_version("1.1.0").unwrap();

    let destination = tempfile::tempdir().unwrap();
    m.save_to_disk(destination.path()).unwrap();

    let mut copy = Mod::new();
    copy.load_from_disk(destination.path(), false).unwrap();
    assert_eq!(copy.version().unwrap(), "1.1.0");
    assert_eq!(copy.blocks().unwrap(), m.blocks().unwrap());
    assert_eq!(copy.resources().unwrap(), m.resources().unwrap());
}

#[test]
fn read_only_mod_can_still_be_exported() {
    let source = tempfile::tempdir().unwrap();
    fs::write(source.path().join("Mod.xml"), "<Mod><Name>Plain</Name></Mod>").unwrap();

    let mut m = Mod::new();
    m.load_from_disk(source.path(), false).unwrap();
    let xml = m.to_xml().unwrap();
    assert!(xml.contains("<Name>Plain</Name>"));
}

#[test]
fn nothing_to_save_before_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let m = Mod::new();
    assert!(matches!(
        m.save_to_disk(dir.path()),
        Err(ModError::Uninitialized { .. })
    ));
    assert!(!dir.path().join("Mod.xml").exists());
}

#[test]
fn clone_refuses_block_paths_outside_the_mod() {
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("victim.xml");
    fs::write(&target, "<Block><Name>orig</Name></Block>").unwrap();
    fs::write(outside.path().join("sibling.xml"), "<Block/>").unwrap();

    let source = tempfile::tempdir().unwrap();
    let escaping = vec![
        target.display().to_string(),
        format!(
            "../{}/sibling.xml",
            outside.path().file_name().unwrap().to_string_lossy()
        ),
    ];
    for path in escaping {
        fs::write(
            source.path().join("Mod.xml"),
            format!(
                r#"<Mod><Name>Sneaky</Name><Blocks><Block path="{}"/></Blocks></Mod>"#,
                path
            ),
        )
        .unwrap();

        let mut m = Mod::new();
        let err = m.load_from_disk(source.path(), true).unwrap_err();
        assert!(
            matches!(err, ModError::ManifestFormat { .. }),
            "{} gave {:?}",
            path,
            err
        );
        assert!(matches!(
            m.save_to_disk(tempfile::tempdir().unwrap().path()),
            Err(ModError::Uninitialized { .. })
        ));
    }

    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "<Block><Name>orig</Name></Block>"
    );
}
