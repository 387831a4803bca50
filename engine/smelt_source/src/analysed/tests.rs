use pretty_assertions::assert_eq;

use smelt_hash::ContentHash;

use super::*;

fn sample_fortran() -> AnalysedFortran {
    let mut a = AnalysedFortran::new("/src/foo.f90", ContentHash::new(123));
    a.add_module_def("Foo_Mod");
    a.add_program_def("MAIN");
    a.add_symbol_def("helper");
    a.add_module_dep("Bar_Mod");
    a.add_symbol_dep("external_thing");
    a.mo_commented_file_deps.insert("util.o".to_string());
    a
}

#[test]
fn fortran_names_are_lowercased() {
    let a = sample_fortran();
    assert!(a.module_defs.contains("foo_mod"));
    assert!(a.program_defs.contains("main"));
    assert!(a.module_deps.contains("bar_mod"));
    assert!(!a.module_defs.contains("Foo_Mod"));
}

#[test]
fn module_defs_are_also_symbol_defs() {
    let a = sample_fortran();
    assert!(a.symbol_defs.contains("foo_mod"));
    assert!(a.symbol_defs.contains("main"));
    assert!(a.symbol_deps.contains("bar_mod"));
}

#[test]
fn record_name_embeds_stem_and_hash() {
    let path = record_path(
        Path::new("/proj/build_output/_prebuild"),
        Path::new("/src/sub/foo.f90"),
        ContentHash::new(0x1ff6_e93b),
    );
    assert_eq!(
        path,
        Path::new("/proj/build_output/_prebuild/foo.000000001ff6e93b.an")
    );
}

#[test]
fn record_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let original = sample_fortran();
    let record = record_path(dir.path(), &original.fpath, original.file_hash);

    save_record(&record, &original).unwrap();
    let loaded: AnalysedFortran = load_record(&record).unwrap();

    // Equality covers every field; a record must capture the whole analysis.
    assert_eq!(loaded, original);
}

#[test]
fn missing_record_loads_as_none() {
    let loaded: Option<AnalysedFortran> = load_record(Path::new("/no/such/record.an"));
    assert!(loaded.is_none());
}

#[test]
fn corrupt_record_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("foo.deadbeef.an");
    std::fs::write(&record, b"not bincode").unwrap();

    let loaded: Option<AnalysedFortran> = load_record(&record);
    assert!(loaded.is_none());
}

#[test]
fn unit_accessors_dispatch_by_language() {
    let f = AnalysedUnit::Fortran(sample_fortran());
    assert_eq!(f.fpath(), Path::new("/src/foo.f90"));
    assert!(f.symbol_defs().contains("foo_mod"));
    assert!(f.as_fortran().is_some());

    let mut c = AnalysedC::new("/src/util.c", ContentHash::new(9));
    c.add_symbol_def("util_init");
    let c = AnalysedUnit::C(c);
    assert!(c.symbol_defs().contains("util_init"));
    assert!(c.as_fortran().is_none());
}
