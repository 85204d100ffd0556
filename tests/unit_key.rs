/// Unit tests for Key identity, hashing and display

use ferrous_container::{key_of_type, Key};
use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

fn hash_of(key: &Key) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

trait Plugin: Send + Sync {}

#[test]
fn test_key_display_name() {
    assert_eq!(Key::from("db").display_name(), "db");
    assert_eq!(Key::of::<String>().display_name(), "alloc::string::String");
    assert!(Key::of::<dyn Plugin>().to_string().ends_with("Plugin"));
}

#[test]
fn test_type_keys_compare_by_type_id_only() {
    let canonical = Key::of::<u32>();
    let renamed = Key::Type(TypeId::of::<u32>(), "<instance>", None);
    assert_eq!(canonical, renamed);
    assert_eq!(hash_of(&canonical), hash_of(&renamed));
    assert_ne!(canonical, Key::of::<u64>());
}

#[test]
fn test_names_and_types_never_collide() {
    let by_name = Key::from("u32");
    let by_type = Key::of::<u32>();
    assert_ne!(by_name, by_type);
    assert!(by_name.is_name());
    assert!(by_type.is_type());
    assert_eq!(by_name.type_id(), None);
    assert_eq!(by_type.type_id(), Some(TypeId::of::<u32>()));
}

#[test]
fn test_name_constructors_agree() {
    let borrowed = Key::from("cache");
    let owned = Key::from(String::from("cache"));
    let named = Key::named("cache");
    assert_eq!(borrowed, owned);
    assert_eq!(owned, named);
    assert_eq!(hash_of(&borrowed), hash_of(&owned));
    assert_eq!(Key::from(&named), named);
}

#[test]
fn test_keys_in_hash_set() {
    let mut set = HashSet::new();
    set.insert(Key::of::<String>());
    set.insert(Key::Type(TypeId::of::<String>(), "other spelling", None));
    set.insert(Key::from("String"));
    set.insert(Key::of::<dyn Plugin>());
    assert_eq!(set.len(), 3);
}

#[test]
fn test_key_of_type_helper() {
    assert_eq!(key_of_type::<dyn Plugin>(), Key::of::<dyn Plugin>());
}

#[test]
fn test_injectable_key_carries_constructor() {
    struct Widget;
    ferrous_container::injectable!(Widget {});

    let carrying = Key::injectable::<Widget>();
    assert_eq!(carrying, Key::of::<Widget>());
    assert_eq!(hash_of(&carrying), hash_of(&Key::of::<Widget>()));
    assert_eq!(carrying.blueprint().map(|b| b.type_id()), Some(TypeId::of::<Widget>()));
    assert!(Key::of::<Widget>().blueprint().is_none());
    assert!(Key::from("Widget").blueprint().is_none());
}
