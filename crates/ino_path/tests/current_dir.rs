//! Empty search path components resolve against the working directory,
//! which is process wide, so every test here holds `CWD_LOCK`.

#![ allow( clippy::unwrap_used ) ]
#![ allow( clippy::expect_used ) ]

use assert_fs::prelude::*;
use assert_fs::TempDir;
use assert2::check;

use ino_path::executable_exists_in;
use ino_path::Executables;
use ino_path::PathCursor;

use std::fs::set_permissions;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

static CWD_LOCK: Mutex<()> = Mutex::new( () );

/// Holds the lock and moves into a fresh tempdir.
struct InTempDir {
    dir: TempDir,
    _guard: MutexGuard<'static, ()>,
}

impl InTempDir {
    fn enter() -> Self {
        let guard = CWD_LOCK.lock()
            .unwrap_or_else( std::sync::PoisonError::into_inner );
        let dir = TempDir::new().expect( "Failed to setup tempdir" );
        std::env::set_current_dir( dir.path() ).unwrap();
        Self { dir, _guard: guard }
    }

    fn put_executable( &self, name: &str ) {
        let file = self.dir.child( name );
        file.write_str( "#!/bin/sh\n" ).unwrap();
        set_permissions( &file, Permissions::from_mode( 0o755 ) ).unwrap();
    }
}

fn put_executable( dir: &Path, name: &str ) -> PathBuf {
    let file = dir.join( name );
    std::fs::write( &file, "#!/bin/sh\n" ).unwrap();
    set_permissions( &file, Permissions::from_mode( 0o755 ) ).unwrap();
    file
}

#[ test ]
fn leading_empty_component_first() {
    let cwd = InTempDir::enter();
    cwd.put_executable( "name" );
    let other = TempDir::new().unwrap();
    put_executable( other.path(), "name" );

    let search_path = format!( ":{}", other.path().display() );
    let ( found, cursor ) = PathCursor::new( search_path.as_ref() )
        .next_executable( "name" );

    check!( found == Some( PathBuf::from( "name" ) ) );
    check!( cursor.remaining() == Some( other.path().as_os_str() ) );
}

#[ test ]
fn doubled_separator_yields_both_in_order() {
    let cwd = InTempDir::enter();
    cwd.put_executable( "name" );
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    let in_b = put_executable( b.path(), "name" );

    let search_path =
        format!( "{}::{}", a.path().display(), b.path().display() );
    let all = Executables::new(
        "name".as_ref(), PathCursor::new( search_path.as_ref() )
    ).collect::<Vec<_>>();

    check!( all == [ PathBuf::from( "name" ), in_b ] );
}

#[ test ]
fn trailing_empty_component_probed_last() {
    let cwd = InTempDir::enter();
    cwd.put_executable( "name" );
    let a = TempDir::new().unwrap();

    let search_path = format!( "{}:", a.path().display() );
    let mut cursor = PathCursor::new( search_path.as_ref() );

    check!( ino_path::find_executable( "name", &mut cursor )
        == Some( PathBuf::from( "name" ) ) );
    check!( cursor.is_exhausted() );
}

#[ test ]
fn only_colons_find_current_dir_each_time() {
    let cwd = InTempDir::enter();
    cwd.put_executable( "name" );

    let all = Executables::new(
        "name".as_ref(), PathCursor::new( "::".as_ref() )
    ).collect::<Vec<_>>();

    check!( all == vec![ PathBuf::from( "name" ); 3 ] );
}

#[ test ]
fn exists_through_current_dir() {
    let cwd = InTempDir::enter();
    cwd.put_executable( "name" );

    check!( executable_exists_in( "name", Some( ":".as_ref() ) ) );
    check!( !executable_exists_in( "missing", Some( ":".as_ref() ) ) );
    // empty search path has no components, not even the current dir
    check!( !executable_exists_in( "name", Some( "".as_ref() ) ) );
}
