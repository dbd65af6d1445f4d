//! End-to-end behavior of the database: resolution ranking, fallback,
//! stylus groups and pairing, and descriptor-file loading.

use tabletdb::builder::Builder;
use tabletdb::stylus::{EraserType, Stylus, StylusId};
use tabletdb::tablet::StylusRef;
use tabletdb::{BusType, Database, Fallback, MatchRule, Tablet};

const USBID: (u16, u16) = (0x1234, 0x5678);

fn rule(name: Option<&str>, uniq: Option<&str>) -> MatchRule {
    MatchRule {
        name: name.map(Into::into),
        uniq: uniq.map(Into::into),
        ..MatchRule::new(BusType::Usb, USBID.0, USBID.1)
    }
}

fn tablet(name: &str, rules: Vec<MatchRule>) -> Tablet {
    Tablet {
        name: name.into(),
        matches: rules.into_iter().collect(),
        ..Tablet::default()
    }
}

fn generic_tablet() -> Tablet {
    let mut t = tablet("Generic Tablet", vec![MatchRule::generic()]);
    t.class = tabletdb::tablet::Class::Generic;
    t
}

fn stylus(id: StylusId, group: Option<&str>, paired: &[StylusId]) -> Stylus {
    Stylus {
        id,
        name: format!("Stylus {id}"),
        group: group.map(Into::into),
        paired_ids: paired.to_vec(),
        ..Stylus::default()
    }
}

#[test]
fn exact_matches_prefer_the_most_specific_rule() {
    let db = Database::from_parts(
        vec![
            tablet("UniqOnly", vec![rule(None, Some("uniqval"))]),
            tablet("NameOnly", vec![rule(Some("nameval"), None)]),
            tablet("Both", vec![rule(Some("nameval"), Some("uniqval"))]),
        ],
        vec![],
    );

    let found = db
        .resolve(&Builder::new().usbid(USBID.0, USBID.1).uniq("uniqval").build())
        .unwrap();
    assert_eq!(found.name, "UniqOnly");

    let found = db
        .resolve(
            &Builder::new()
                .usbid(USBID.0, USBID.1)
                .match_name("nameval")
                .build(),
        )
        .unwrap();
    assert_eq!(found.name, "NameOnly");

    let found = db
        .resolve(
            &Builder::new()
                .usbid(USBID.0, USBID.1)
                .match_name("nameval")
                .uniq("uniqval")
                .build(),
        )
        .unwrap();
    assert_eq!(found.name, "Both");
}

#[test]
fn uniq_wins_over_name_when_no_exact_rule_exists() {
    let db = Database::from_parts(
        vec![
            tablet("UniqOnly", vec![rule(None, Some("uniqval"))]),
            tablet("NameOnly", vec![rule(Some("nameval"), None)]),
        ],
        vec![],
    );

    // Both fields satisfied by different descriptors: uniq outranks name.
    let found = db
        .resolve(
            &Builder::new()
                .usbid(USBID.0, USBID.1)
                .match_name("nameval")
                .uniq("uniqval")
                .build(),
        )
        .unwrap();
    assert_eq!(found.name, "UniqOnly");

    // Unmatched uniq falls back to the name rule, and vice versa.
    let found = db
        .resolve(
            &Builder::new()
                .usbid(USBID.0, USBID.1)
                .match_name("nameval")
                .uniq("whatever")
                .build(),
        )
        .unwrap();
    assert_eq!(found.name, "NameOnly");

    let found = db
        .resolve(
            &Builder::new()
                .usbid(USBID.0, USBID.1)
                .match_name("whatever")
                .uniq("uniqval")
                .build(),
        )
        .unwrap();
    assert_eq!(found.name, "UniqOnly");
}

#[test]
fn both_field_rules_reject_partial_satisfaction() {
    let db = Database::from_parts(
        vec![tablet("Both", vec![rule(Some("nameval"), Some("uniqval"))])],
        vec![],
    );

    assert!(db
        .resolve(
            &Builder::new()
                .usbid(USBID.0, USBID.1)
                .match_name("wrong")
                .uniq("uniqval")
                .build(),
        )
        .is_none());
    assert!(db
        .resolve(
            &Builder::new()
                .usbid(USBID.0, USBID.1)
                .match_name("nameval")
                .uniq("wrong")
                .build(),
        )
        .is_none());
}

#[test]
fn zeroed_ids_never_match_but_fallback_still_synthesizes() {
    let db = Database::from_parts(
        vec![generic_tablet(), tablet("Real", vec![rule(None, None)])],
        vec![],
    );

    for bus in [BusType::Unknown, BusType::Usb, BusType::Serial] {
        let query = Builder::new().bus(bus).usbid(0, 0).build();
        assert!(db.resolve(&query).is_none());

        let query = Builder::new()
            .bus(bus)
            .usbid(0, 0)
            .fallback(Fallback::Generic)
            .build();
        let found = db.resolve(&query).unwrap();
        assert!(found.is_generic());
    }
}

#[test]
fn fallback_identity_is_always_zeroed() {
    let db = Database::from_parts(
        vec![generic_tablet(), tablet("Real", vec![rule(None, None)])],
        vec![],
    );

    let query = Builder::new()
        .bus(BusType::Usb)
        .usbid(0xdead, 0xbeef)
        .fallback(Fallback::Generic)
        .build();
    let found = db.resolve(&query).unwrap();
    assert_eq!(found.bustype(), BusType::Unknown);
    assert_eq!((found.vendor_id(), found.product_id()), (0, 0));
    // No override: the generic record's own name.
    assert_eq!(found.name, "Generic Tablet");

    let query = Builder::new()
        .usbid(0xdead, 0xbeef)
        .device_name("does not exist")
        .fallback(Fallback::Generic)
        .build();
    let found = db.resolve(&query).unwrap();
    assert_eq!(found.name, "does not exist");
}

#[test]
fn fallback_without_generic_record_is_a_miss() {
    let db = Database::from_parts(vec![tablet("Real", vec![rule(None, None)])], vec![]);
    let query = Builder::new()
        .usbid(0xdead, 0xbeef)
        .fallback(Fallback::Generic)
        .build();
    assert!(db.resolve(&query).is_none());
}

#[test]
fn empty_query_matches_nothing_but_the_fallback() {
    let db = Database::from_parts(
        vec![generic_tablet(), tablet("Real", vec![rule(None, None)])],
        vec![],
    );
    assert!(db.resolve(&Builder::new().build()).is_none());
    let found = db
        .resolve(&Builder::new().fallback(Fallback::Generic).build())
        .unwrap();
    assert!(found.is_generic());
}

#[test]
fn group_references_expand_without_duplicates() {
    let a = StylusId::new(0x1234, 0xabcd);
    let b = StylusId::new(0x1234, 0x9876);
    let other = StylusId::new(0x56a, 0x822);

    let mut t = tablet("GroupTablet", vec![rule(None, None)]);
    // The literal id overlaps with the group; it must not show up twice.
    t.styli = vec![
        StylusRef::Id(a),
        StylusRef::Group("notwacom".into()),
        StylusRef::Group("missing-group".into()),
    ];

    let db = Database::from_parts(
        vec![t],
        vec![
            stylus(a, Some("notwacom"), &[b]),
            stylus(b, Some("notwacom"), &[a]),
            stylus(other, Some("wacom"), &[]),
        ],
    );

    let found = db.resolve(&Builder::new().usbid(USBID.0, USBID.1).build()).unwrap();
    let ids: Vec<StylusId> = found.styli(&db).iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a, b]);
}

#[test]
fn pairing_resolves_against_the_full_store() {
    let pen = StylusId::new(0x1234, 0xabcd);
    let eraser = StylusId::new(0x1234, 0x9876);

    // Only the tablet's styli list mentions the pen; pairing must still
    // find the eraser (and back) through the whole store.
    let mut t = tablet("PairTablet", vec![rule(None, None)]);
    t.styli = vec![StylusRef::Id(pen)];

    let mut eraser_stylus = stylus(eraser, None, &[pen]);
    eraser_stylus.eraser_type = Some(EraserType::Invert);

    let db = Database::from_parts(vec![t], vec![stylus(pen, None, &[eraser]), eraser_stylus]);

    let pen_stylus = db.stylus(pen).unwrap();
    let paired = pen_stylus.paired_styli(&db);
    assert_eq!(paired.len(), 1);
    assert_eq!(paired[0].id, eraser);
    assert!(paired[0].is_eraser());
    assert!(pen_stylus.has_eraser(&db));

    // Symmetric in effect: the eraser names the pen too.
    let back = db.stylus(eraser).unwrap().paired_styli(&db);
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].id, pen);

    // Unknown paired ids are silently omitted.
    let dangling = stylus(StylusId::new(1, 2), None, &[StylusId::new(9, 9)]);
    let db = Database::from_parts(vec![], vec![dangling]);
    assert!(db.stylus(StylusId::new(1, 2)).unwrap().paired_styli(&db).is_empty());
}

#[test]
fn first_rule_roundtrips_to_its_own_tablet() {
    let full = MatchRule {
        name: Some("Tablet Pen".into()),
        uniq: Some("SN-001".into()),
        ..MatchRule::new(BusType::Bluetooth, 0x56a, 0xbd)
    };
    let db = Database::from_parts(
        vec![
            tablet("Decoy", vec![rule(None, None)]),
            tablet("Target", vec![full.clone()]),
        ],
        vec![],
    );

    let query = Builder::new()
        .bus(full.bus)
        .usbid(full.vendor_id, full.product_id)
        .match_name(full.name.clone().unwrap())
        .uniq(full.uniq.clone().unwrap())
        .build();
    let found = db.resolve(&query).unwrap();
    assert_eq!(found.name, "Target");
    assert_eq!(found.matched(), &full);
}

mod files {
    //! The same behaviors driven through real descriptor files.

    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_default_styli(dir: &Path) {
        fs::write(
            dir.join("generic.stylus"),
            "\
[0x0:0xfffff]
Name=General Pen
Group=generic-with-eraser
PairedStylusIds=0x0:0xffffe
Buttons=2
Axes=Tilt;Pressure;Distance
Type=General

[0x0:0xffffe]
Name=General Pen Eraser
Group=generic-with-eraser
PairedStylusIds=0x0:0xfffff
EraserType=Invert
Buttons=0
Axes=Tilt;Pressure;Distance
Type=General
",
        )
        .unwrap();
    }

    fn write_generic_tablet(dir: &Path) {
        fs::write(
            dir.join("generic.tablet"),
            "\
[Device]
Name=Generic
DeviceMatch=generic
Class=Generic
Width=9
Height=6
[Features]
Stylus=true
",
        )
        .unwrap();
    }

    #[test]
    fn open_resolve_and_derive() {
        let dir = tempfile::tempdir().unwrap();
        write_default_styli(dir.path());
        write_generic_tablet(dir.path());
        fs::write(
            dir.path().join("pad.tablet"),
            "\
[Device]
Name=Test Pad
DeviceMatch=usb|1234|5678
Class=Intuos4
Width=8
Height=5
[Features]
Stylus=true
Buttons=6
NumRings=2
StatusLEDs=Ring;Ring2
[Buttons]
Left=A;B;C
Right=D;E;F
Ring=A
Ring2=D
",
        )
        .unwrap();

        let db = Database::new_for_path(dir.path()).unwrap();
        assert!(db.rejected().is_empty());

        let found = db
            .resolve(&Builder::new().usbid(0x1234, 0x5678).build())
            .unwrap();
        assert_eq!(found.name, "Test Pad");
        assert_eq!(found.bustype(), BusType::Usb);

        use tabletdb::ButtonFlags;
        assert_eq!(
            found.button_flags('A'),
            ButtonFlags::LEFT | ButtonFlags::RING_MODESWITCH
        );
        assert_eq!(
            found.button_flags('D'),
            ButtonFlags::RIGHT | ButtonFlags::RING2_MODESWITCH
        );
        assert_eq!(found.button_led_group('A'), Some(0));
        assert_eq!(found.button_led_group('D'), Some(1));
        for b in ['B', 'C', 'E', 'F'] {
            assert_eq!(found.button_led_group(b), None);
        }

        // Unlisted styli default to the generic pen/eraser pair.
        let styli = db.styli_for(&found);
        let ids: Vec<StylusId> = styli.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![StylusId::GENERIC_ERASER, StylusId::GENERIC_PEN]);
        assert!(db.stylus(StylusId::GENERIC_PEN).unwrap().has_eraser(&db));
    }

    #[test]
    fn user_directory_shadows_system() {
        let sys = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        write_default_styli(sys.path());
        fs::write(
            sys.path().join("tablet.tablet"),
            "[Device]\nName=System Name\nDeviceMatch=usb|1234|5678\n[Features]\nStylus=true\n",
        )
        .unwrap();
        fs::write(
            user.path().join("override.tablet"),
            "[Device]\nName=User Name\nDeviceMatch=usb|1234|5678\n[Features]\nStylus=true\n",
        )
        .unwrap();

        let db = Database::new_for_paths([sys.path(), user.path()]).unwrap();
        assert_eq!(db.tablets().len(), 1);
        let found = db
            .resolve(&Builder::new().usbid(0x1234, 0x5678).build())
            .unwrap();
        assert_eq!(found.name, "User Name");
    }

    #[test]
    fn rejected_files_are_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_default_styli(dir.path());
        write_generic_tablet(dir.path());
        fs::write(dir.path().join("broken.tablet"), "[Device]\nName=Broken\n").unwrap();

        let db = Database::new_for_path(dir.path()).unwrap();
        assert_eq!(db.rejected().len(), 1);
        assert!(db.rejected()[0].path.ends_with("broken.tablet"));
        assert!(db.find_by_name("Generic").is_some());
        assert!(db.find_by_name("Broken").is_none());
    }

    #[test]
    fn empty_database_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = Database::new_for_path(dir.path()).unwrap_err();
        let tabletdb::OpenError::Empty(rejected) = err;
        assert!(rejected.is_empty());
    }

    #[test]
    fn wildcard_bus_finds_bluetooth_records() {
        let dir = tempfile::tempdir().unwrap();
        write_default_styli(dir.path());
        fs::write(
            dir.path().join("wl.tablet"),
            "[Device]\nName=Intuos4 WL\nDeviceMatch=bluetooth|056a|00bd\n[Features]\nStylus=true\n",
        )
        .unwrap();

        let db = Database::new_for_path(dir.path()).unwrap();
        let found = db
            .resolve(&Builder::new().usbid(0x56a, 0xbd).build())
            .unwrap();
        assert_eq!(found.name, "Intuos4 WL");
        assert_eq!(found.bustype(), BusType::Bluetooth);
    }
}
