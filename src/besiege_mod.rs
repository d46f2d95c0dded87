use crate::document::{self, Element};
use crate::error::{ModError, ModState, Result};
use crate::manifest::{self, Manifest, ManifestTemplate, ManifestValue};
use crate::store::{DiskStore, FileStore};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

const MANIFEST_FILE: &str = "Mod.xml";

/// A file a mod ships, declared under `<Resources>` with its type as the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub path: String,
    pub name: String,
}

impl Resource {
    pub fn new(
        resource_type: impl Into<String>,
        path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            path: path.into(),
            name: name.into(),
        }
    }
}

/// A parsed block or entity definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectManifest {
    /// Path relative to the mod directory, `None` for objects created in memory.
    pub path: Option<String>,
    pub document: Element,
}

#[derive(Debug, Default)]
struct Contents {
    /// Directory the mod was loaded from.
    origin: Option<PathBuf>,
    manifest: Manifest,
    assembly_paths: Vec<String>,
    block_manifests: Vec<ObjectManifest>,
    entity_manifests: Vec<ObjectManifest>,
    resources: IndexMap<String, Resource>,
}

impl Contents {
    fn manifest_path(&self) -> PathBuf {
        match &self.origin {
            Some(origin) => origin.join(MANIFEST_FILE),
            None => PathBuf::from(MANIFEST_FILE),
        }
    }

    fn text(&self, field: &str) -> Result<&str> {
        match self.manifest.get(field) {
            Some(value) => value.as_text().ok_or_else(|| {
                ModError::format(self.manifest_path(), format!("<{}> must hold text", field))
            }),
            None => Err(ModError::format(
                self.manifest_path(),
                format!("<{}> is missing", field),
            )),
        }
    }

    fn flag(&self, field: &str) -> Result<bool> {
        let value = self.text(field)?;
        parse_flag(value).ok_or_else(|| {
            ModError::format(
                self.manifest_path(),
                format!("<{}> must be true or false, found {:?}", field, value),
            )
        })
    }

    fn set_text(&mut self, field: &str, value: String) {
        self.manifest.insert(field, ManifestValue::Text(value));
    }
}

#[derive(Debug)]
enum State {
    Uninitialized,
    ReadOnly(Contents),
    Editable(Contents),
}

/// A Besiege mod manifest, either loaded from a mod directory or built in memory.
///
/// A `Mod` starts out empty and is initialized exactly once, by
/// [`create_new`](Mod::create_new) or [`load_from_disk`](Mod::load_from_disk).
/// Created mods and clones are editable; a plain load is read-only.
#[derive(Debug)]
pub struct Mod {
    state: State,
}

impl Default for Mod {
    fn default() -> Self {
        Self {
            state: State::Uninitialized,
        }
    }
}

impl Mod {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ModState {
        match self.state {
            State::Uninitialized => ModState::Uninitialized,
            State::ReadOnly(_) => ModState::ReadOnly,
            State::Editable(_) => ModState::Editable,
        }
    }

    /// Loaded from disk in place, not editable.
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, State::ReadOnly(_))
    }

    /// Created from scratch or loaded as a clone, editable.
    pub fn is_virtual(&self) -> bool {
        matches!(self.state, State::Editable(_))
    }

    /// Directory this mod was loaded from, if any.
    pub fn origin(&self) -> Result<Option<&Path>> {
        Ok(self.contents("get origin")?.origin.as_deref())
    }

    pub fn create_new(&mut self, name: &str, author: &str) -> Result<()> {
        self.create_from_template(&ManifestTemplate::default(), name, author)
    }

    pub fn create_from_template(
        &mut self,
        template: &ManifestTemplate,
        name: &str,
        author: &str,
    ) -> Result<()> {
        self.ensure_uninitialized("create mod")?;

        info!(mod_name = name, author, "creating new mod");
        self.state = State::Editable(Contents {
            manifest: Manifest::from_template(template, name, author),
            ..Contents::default()
        });
        Ok(())
    }

    pub fn load_from_disk(&mut self, path: impl AsRef<Path>, clone: bool) -> Result<()> {
        self.load_from_store(&DiskStore, path, clone)
    }

    /// Load `{path}/Mod.xml` and everything it references through `store`.
    ///
    /// Nothing is committed until every referenced file has been read, so a
    /// failed load leaves the mod uninitialized.
    pub fn load_from_store<S: FileStore + ?Sized>(
        &mut self,
        store: &S,
        path: impl AsRef<Path>,
        clone: bool,
    ) -> Result<()> {
        self.ensure_uninitialized("load mod")?;

        let root = path.as_ref();
        let contents = read_contents(store, root)?;

        info!(
            path = %root.display(),
            clone,
            assemblies = contents.assembly_paths.len(),
            blocks = contents.block_manifests.len(),
            entities = contents.entity_manifests.len(),
            resources = contents.resources.len(),
            "loaded mod"
        );
        self.state = if clone {
            State::Editable(contents)
        } else {
            State::ReadOnly(contents)
        };
        Ok(())
    }

    /// Serialize the manifest as a `Mod.xml` document.
    pub fn to_xml(&self) -> Result<String> {
        let contents = self.contents("serialize mod")?;
        document::serialize(&contents.manifest.to_element())
            .map_err(|e| serialize_error(contents.manifest_path(), e))
    }

    pub fn save_to_disk(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_to_store(&mut DiskStore, path)
    }

    /// Write `{path}/Mod.xml` and every block and entity file that has a path.
    ///
    /// Object paths must stay inside `path`; an absolute or `..` path is
    /// `ManifestFormat` and nothing is written.
    pub fn save_to_store<S: FileStore + ?Sized>(
        &self,
        store: &mut S,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let contents = self.contents("save mod")?;
        let root = path.as_ref();

        let manifest_path = root.join(MANIFEST_FILE);
        let mut files = vec![(
            manifest_path.clone(),
            document::serialize(&contents.manifest.to_element())
                .map_err(|e| serialize_error(&manifest_path, e))?,
        )];

        let objects = contents
            .block_manifests
            .iter()
            .chain(contents.entity_manifests.iter());
        for object in objects {
            let relative = match &object.path {
                Some(relative) => relative,
                None => {
                    debug!(tag = %object.document.name, "skipping object without a path");
                    continue;
                }
            };
            let object_path = enclosed_path(root, relative, &manifest_path)?;
            let xml = document::serialize(&object.document)
                .map_err(|e| serialize_error(&object_path, e))?;
            files.push((object_path, xml));
        }

        for (file_path, xml) in &files {
            store.write(file_path, xml)?;
        }

        info!(path = %root.display(), "saved mod");
        Ok(())
    }

    pub fn manifest(&self) -> Result<&Manifest> {
        Ok(&self.contents("get manifest")?.manifest)
    }

    pub fn name(&self) -> Result<&str> {
        self.contents("get name")?.text(manifest::NAME)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.contents_mut("set name")?
            .set_text(manifest::NAME, name.into());
        Ok(())
    }

    pub fn author(&self) -> Result<&str> {
        self.contents("get author")?.text(manifest::AUTHOR)
    }

    pub fn set_author(&mut self, author: impl Into<String>) -> Result<()> {
        self.contents_mut("set author")?
            .set_text(manifest::AUTHOR, author.into());
        Ok(())
    }

    pub fn version(&self) -> Result<&str> {
        self.contents("get version")?.text(manifest::VERSION)
    }

    pub fn set_version(&mut self, version: impl Into<String>) -> Result<()> {
        self.contents_mut("set version")?
            .set_text(manifest::VERSION, version.into());
        Ok(())
    }

    pub fn description(&self) -> Result<&str> {
        self.contents("get description")?
            .text(manifest::DESCRIPTION)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        self.contents_mut("set description")?
            .set_text(manifest::DESCRIPTION, description.into());
        Ok(())
    }

    pub fn is_debug(&self) -> Result<bool> {
        self.contents("get debug")?.flag(manifest::DEBUG)
    }

    pub fn set_debug(&mut self, debug: bool) -> Result<()> {
        self.contents_mut("set debug")?
            .set_text(manifest::DEBUG, debug.to_string());
        Ok(())
    }

    pub fn is_multiplayer_compatible(&self) -> Result<bool> {
        self.contents("get multiplayer compatibility")?
            .flag(manifest::MULTIPLAYER_COMPATIBLE)
    }

    pub fn set_multiplayer_compatible(&mut self, multiplayer_compatible: bool) -> Result<()> {
        self.contents_mut("set multiplayer compatibility")?
            .set_text(
                manifest::MULTIPLAYER_COMPATIBLE,
                multiplayer_compatible.to_string(),
            );
        Ok(())
    }

    pub fn id(&self) -> Result<&str> {
        self.contents("get id")?.text(manifest::ID)
    }

    /// Only use this if you know what you're doing: content made against an
    /// older release of the mod refers to it by ID and stops resolving once
    /// the ID changes.
    pub fn set_id(&mut self, id: impl Into<String>) -> Result<()> {
        let contents = self.contents_mut("set id")?;
        let id = id.into();
        if let Ok(old) = contents.text(manifest::ID) {
            if !old.is_empty() && old != id {
                warn!(old, new = %id, "changing the ID of a mod that already has one");
            }
        }
        contents.set_text(manifest::ID, id);
        Ok(())
    }

    /// Read-only view of the referenced assemblies. Use
    /// [`add_assembly`](Mod::add_assembly) to change it.
    pub fn assemblies(&self) -> Result<&[String]> {
        Ok(&self.contents("get assemblies")?.assembly_paths)
    }

    /// Reference another assembly, adding an `<Assembly path=".."/>` entry.
    pub fn add_assembly(&mut self, path: impl Into<String>) -> Result<()> {
        let contents = self.contents_mut("add assembly")?;
        let path = path.into();
        let entry = Element::new("Assembly").with_attribute("path", path.as_str());

        match contents.manifest.get_mut(manifest::ASSEMBLIES) {
            Some(ManifestValue::Node(section)) => section.children.push(entry),
            Some(ManifestValue::Text(_)) => {
                return Err(ModError::format(
                    contents.manifest_path(),
                    "<Assemblies> must hold elements",
                ))
            }
            Some(ManifestValue::Null) | None => contents.manifest.insert(
                manifest::ASSEMBLIES,
                ManifestValue::Node(Element::new(manifest::ASSEMBLIES).with_child(entry)),
            ),
        }

        debug!(path = %path, "added assembly");
        contents.assembly_paths.push(path);
        Ok(())
    }

    pub fn blocks(&self) -> Result<&[ObjectManifest]> {
        Ok(&self.contents("get blocks")?.block_manifests)
    }

    /// Append an empty `<Block>` definition and return its index in [`blocks`](Mod::blocks).
    pub fn create_block(&mut self) -> Result<usize> {
        let contents = self.contents_mut("create block")?;
        contents.block_manifests.push(ObjectManifest {
            path: None,
            document: Element::new("Block"),
        });
        Ok(contents.block_manifests.len() - 1)
    }

    pub fn entities(&self) -> Result<&[ObjectManifest]> {
        Ok(&self.contents("get entities")?.entity_manifests)
    }

    /// Append an empty `<Entity>` definition and return its index in [`entities`](Mod::entities).
    pub fn create_entity(&mut self) -> Result<usize> {
        let contents = self.contents_mut("create entity")?;
        contents.entity_manifests.push(ObjectManifest {
            path: None,
            document: Element::new("Entity"),
        });
        Ok(contents.entity_manifests.len() - 1)
    }

    // Triggers, events and keys are not modelled; these hand back the raw section.

    pub fn triggers(&self) -> Result<Option<&ManifestValue>> {
        Ok(self.contents("get triggers")?.manifest.get(manifest::TRIGGERS))
    }

    pub fn events(&self) -> Result<Option<&ManifestValue>> {
        Ok(self.contents("get events")?.manifest.get(manifest::EVENTS))
    }

    pub fn keys(&self) -> Result<Option<&ManifestValue>> {
        Ok(self.contents("get keys")?.manifest.get(manifest::KEYS))
    }

    /// Read-only view of the resources keyed by name. The map can't be
    /// edited through the mod; it only changes by loading.
    pub fn resources(&self) -> Result<&IndexMap<String, Resource>> {
        Ok(&self.contents("get resources")?.resources)
    }

    fn ensure_uninitialized(&self, operation: &'static str) -> Result<()> {
        match self.state() {
            ModState::Uninitialized => Ok(()),
            state => Err(ModError::AlreadyInitialized { operation, state }),
        }
    }

    fn contents(&self, operation: &'static str) -> Result<&Contents> {
        match &self.state {
            State::ReadOnly(contents) | State::Editable(contents) => Ok(contents),
            State::Uninitialized => Err(ModError::Uninitialized { operation }),
        }
    }

    fn contents_mut(&mut self, operation: &'static str) -> Result<&mut Contents> {
        match &mut self.state {
            State::Editable(contents) => Ok(contents),
            State::ReadOnly(_) => Err(ModError::ReadOnly { operation }),
            State::Uninitialized => Err(ModError::Uninitialized { operation }),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn serialize_error(path: impl Into<PathBuf>, source: document::DocumentError) -> ModError {
    ModError::Serialize {
        path: path.into(),
        source,
    }
}

/// Join a path taken from a manifest onto the mod directory, refusing
/// anything that would land outside it.
fn enclosed_path(root: &Path, relative: &str, manifest_path: &Path) -> Result<PathBuf> {
    let relative_path = Path::new(relative);
    let enclosed = relative_path
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !enclosed || relative.is_empty() {
        return Err(ModError::format(
            manifest_path,
            format!("path {:?} points outside the mod directory", relative),
        ));
    }
    Ok(root.join(relative_path))
}

fn read_document<S: FileStore + ?Sized>(store: &S, path: &Path) -> Result<Element> {
    debug!(path = %path.display(), "reading manifest");
    let text = store.read(path)?;
    document::parse(&text).map_err(|e| ModError::ManifestParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn read_contents<S: FileStore + ?Sized>(store: &S, root: &Path) -> Result<Contents> {
    let manifest_path = root.join(MANIFEST_FILE);
    let document = read_document(store, &manifest_path)?;
    if document.name != manifest::ROOT {
        return Err(ModError::format(
            &manifest_path,
            format!("root element is <{}>, expected <Mod>", document.name),
        ));
    }

    let mut contents = Contents {
        origin: Some(root.to_path_buf()),
        manifest: Manifest::from_element(&document),
        ..Contents::default()
    };

    for assembly in section(&contents.manifest, manifest::ASSEMBLIES, &manifest_path)? {
        let path = required_attribute(assembly, "path", &manifest_path)?;
        contents.assembly_paths.push(path.to_string());
    }

    contents.block_manifests =
        read_object_manifests(store, root, &contents.manifest, manifest::BLOCKS)?;
    contents.entity_manifests =
        read_object_manifests(store, root, &contents.manifest, manifest::ENTITIES)?;

    for entry in section(&contents.manifest, manifest::RESOURCES, &manifest_path)? {
        let resource = Resource::new(
            entry.name.as_str(),
            required_attribute(entry, "path", &manifest_path)?,
            required_attribute(entry, "name", &manifest_path)?,
        );
        if let Some(previous) = contents.resources.insert(resource.name.clone(), resource) {
            warn!(
                name = %previous.name,
                overwritten = %previous.resource_type,
                "duplicate resource name, keeping the later entry"
            );
        }
    }

    Ok(contents)
}

fn read_object_manifests<S: FileStore + ?Sized>(
    store: &S,
    root: &Path,
    manifest: &Manifest,
    field: &str,
) -> Result<Vec<ObjectManifest>> {
    let manifest_path = root.join(MANIFEST_FILE);
    let entries = section(manifest, field, &manifest_path)?;
    debug!(section = field, count = entries.len(), "reading object manifests");

    let mut objects = Vec::with_capacity(entries.len());
    for entry in entries {
        let relative = required_attribute(entry, "path", &manifest_path)?;
        let object_path = enclosed_path(root, relative, &manifest_path)?;
        let document = read_document(store, &object_path)?;
        objects.push(ObjectManifest {
            path: Some(relative.to_string()),
            document,
        });
    }
    Ok(objects)
}

/// Child elements of an optional section. Absent and empty sections are both empty.
fn section<'a>(manifest: &'a Manifest, field: &str, manifest_path: &Path) -> Result<&'a [Element]> {
    match manifest.get(field) {
        None | Some(ManifestValue::Null) => Ok(&[]),
        Some(ManifestValue::Node(element)) => Ok(&element.children),
        Some(ManifestValue::Text(_)) => Err(ModError::format(
            manifest_path,
            format!("<{}> must hold elements, not text", field),
        )),
    }
}

fn required_attribute<'a>(element: &'a Element, key: &str, manifest_path: &Path) -> Result<&'a str> {
    element.attribute(key).ok_or_else(|| {
        ModError::format(
            manifest_path,
            format!("<{}> is missing its {} attribute", element.name, key),
        )
    })
}
