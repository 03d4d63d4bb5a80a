#![ allow( clippy::unwrap_used ) ]
#![ allow( clippy::expect_used ) ]

use assert_fs::prelude::*;
use assert_fs::TempDir;
use assert2::check;
use tap::Tap;

use std::fs::set_permissions;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;
use std::process::Output;

const EXE: &str = std::env!( "CARGO_BIN_EXE_exequi" );

fn make_main_program() -> Command {
    let mut cmd = Command::new( EXE );
    for var in [
        "EXEQUI_PREFER_APPLETS",
        "EXEQUI_FORCE_NOEXEC",
        "EXEQUI_FORCE_APPLETS",
        "RUST_LOG",
    ] {
        cmd.env_remove( var );
    }
    cmd
}

macro_rules! make_tempdir {
    () => { {
        TempDir::new().expect( "Failed to setup tempdir" )
    } };
}

fn put_executable( dir: &Path, name: &str ) -> String {
    let file = dir.join( name );
    std::fs::write( &file, "#!/bin/sh\necho hi\n" ).unwrap();
    set_permissions( &file, Permissions::from_mode( 0o755 ) ).unwrap();
    file.display().to_string()
}

fn stdout( output: &Output ) -> String {
    String::from_utf8_lossy( &output.stdout ).into_owned()
}

fn stderr( output: &Output ) -> String {
    String::from_utf8_lossy( &output.stderr ).into_owned()
}

#[ test ]
fn run_missing_program_exits_127() {
    let output = make_main_program()
        .args( [ "run", "/nonexistent/exequi-test" ] )
        .output().unwrap();

    check!( output.status.code() == Some( 127 ) );
    check!( stderr( &output )
        .contains( "can't execute '/nonexistent/exequi-test'" ) );
}

#[ test ]
fn run_non_executable_exits_126() {
    let top = make_tempdir!();
    let file = top.child( "plain" )
        .tap( |it| it.write_str( "just text" ).unwrap() );

    let output = make_main_program()
        .arg( "run" ).arg( file.path() )
        .output().unwrap();

    check!( output.status.code() == Some( 126 ) );
}

#[ test ]
fn run_replaces_process() {
    let output = make_main_program()
        .args( [ "run", "/bin/sh", "-c", "echo $0 $1; exit 3", "zero", "one" ] )
        .output().unwrap();

    check!( output.status.code() == Some( 3 ) );
    check!( stdout( &output ) == "zero one\n" );
}

#[ test ]
fn run_with_fresh_environment() {
    let output = make_main_program()
        .env( "EXEQUI_TEST_LEFTOVER", "1" )
        .args( [
            "run", "-i", "-e", "FOO=bar",
            "/bin/sh", "-c", r#"echo "$FOO${EXEQUI_TEST_LEFTOVER:-unset}""#,
        ] )
        .output().unwrap();

    check!( output.status.success() );
    check!( stdout( &output ) == "barunset\n" );
}

#[ test ]
fn run_extends_environment() {
    let output = make_main_program()
        .env( "EXEQUI_TEST_KEPT", "kept" )
        .args( [
            "run", "-e", "FOO=bar",
            "/bin/sh", "-c", r#"echo "$FOO $EXEQUI_TEST_KEPT""#,
        ] )
        .output().unwrap();

    check!( output.status.success() );
    check!( stdout( &output ) == "bar kept\n" );
}

#[ test ]
fn run_noexec_applet_in_process() {
    let output = make_main_program()
        .env( "PATH", "/nonexistent" )
        .args( [ "--prefer-applets", "run", "false" ] )
        .output().unwrap();

    check!( output.status.code() == Some( 1 ) );
}

#[ test ]
fn run_applet_through_reexec() {
    let top = make_tempdir!();
    let prog = put_executable( top.path(), "prog" );

    let output = make_main_program()
        .env( "PATH", top.path() )
        .env( "EXEQUI_PREFER_APPLETS", "true" )
        .args( [ "run", "which", "prog" ] )
        .output().unwrap();

    check!( output.status.success() );
    check!( stdout( &output ) == format!( "{prog}\n" ) );
}

#[ test ]
fn run_applets_only_refuses_external() {
    let output = make_main_program()
        .args( [ "--prefer-applets", "--force-applets", "run", "/bin/sh" ] )
        .output().unwrap();

    check!( output.status.code() == Some( 127 ) );
}

#[ test ]
fn which_first_and_all() {
    let a = make_tempdir!();
    let b = make_tempdir!();
    let in_a = put_executable( a.path(), "prog" );
    let in_b = put_executable( b.path(), "prog" );
    let search_path =
        format!( "{}::{}", a.path().display(), b.path().display() );

    let output = make_main_program()
        .env( "PATH", &search_path )
        .args( [ "which", "prog" ] )
        .output().unwrap();
    check!( output.status.success() );
    check!( stdout( &output ) == format!( "{in_a}\n" ) );

    let output = make_main_program()
        .env( "PATH", &search_path )
        .current_dir( a.path() )
        .args( [ "which", "-a", "prog" ] )
        .output().unwrap();
    check!( output.status.success() );
    // the empty component is the current directory, a bare name
    check!( stdout( &output ) == format!( "{in_a}\nprog\n{in_b}\n" ) );
}

#[ test ]
fn which_not_found() {
    let top = make_tempdir!();
    let output = make_main_program()
        .env( "PATH", top.path() )
        .args( [ "which", "prog" ] )
        .output().unwrap();

    check!( output.status.code() == Some( 1 ) );
    check!( stdout( &output ).is_empty() );
}

#[ test ]
fn exists() {
    let top = make_tempdir!();
    put_executable( top.path(), "prog" );

    let status = make_main_program()
        .env( "PATH", top.path() )
        .args( [ "exists", "prog" ] )
        .status().unwrap();
    check!( status.success() );

    let status = make_main_program()
        .env( "PATH", "" )
        .args( [ "exists", "prog" ] )
        .current_dir( top.path() )
        .status().unwrap();
    check!( status.code() == Some( 1 ) );
}

#[ test ]
fn invoked_through_applet_symlink() {
    let top = make_tempdir!();
    let prog = put_executable( top.path(), "prog" );
    let link = top.child( "which" )
        .tap( |it| it.symlink_to_file( EXE ).unwrap() );

    let output = Command::new( link.path() )
        .env( "PATH", top.path() )
        .arg( "prog" )
        .output().unwrap();

    check!( output.status.success() );
    check!( stdout( &output ) == format!( "{prog}\n" ) );
}
