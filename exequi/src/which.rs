use ino_path::Executables;
use ino_path::IsExecutable;
use ino_path::PathCursor;

use tracing::debug;

use std::ffi::OsStr;
use std::ffi::OsString;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Locate programs in $PATH.
#[ derive( clap::Parser, Debug ) ]
#[ command( name = "which" ) ]
pub struct WhichOpts {
    /// Print every match, not just the first one.
    #[ arg( short, long ) ]
    pub all: bool,

    /// Programs to look for.
    #[ arg( required = true, value_name = "NAME" ) ]
    pub names: Vec<OsString>,
}

/// Print matches of every name in `opts` to `out`.
///
/// Returns whether all of them were found.
///
/// # Errors
///
/// Only when writing to `out` fails.
#[ tracing::instrument( skip( out ) ) ]
pub fn which(
    opts: &WhichOpts,
    search_path: Option<&OsStr>,
    out: &mut impl Write,
) -> std::io::Result<bool> {
    let mut all_found = true;

    for name in &opts.names {
        // something like "./foo" or "/usr/bin/foo" isn't looked up
        if name.as_bytes().contains( &b'/' ) {
            let found = Path::new( name ).is_executable();
            if found {
                print_path( out, Path::new( name ) )?;
            }
            all_found &= found;
            continue
        }

        let matches = Executables::new(
            name, PathCursor::from_env_value( search_path )
        );
        let mut found = false;

        for path in matches {
            debug!( ?path, "found" );
            print_path( out, &path )?;
            found = true;
            if !opts.all {
                break
            }
        }

        all_found &= found;
    }

    Ok( all_found )
}

fn print_path( out: &mut impl Write, path: &Path ) -> std::io::Result<()> {
    out.write_all( path.as_os_str().as_bytes() )?;
    out.write_all( b"\n" )
}

#[ cfg( test ) ]
#[ allow( clippy::unwrap_used ) ]
mod test {
    use super::*;

    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use assert2::check;

    use std::fs::set_permissions;
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    fn put_executable( dir: &TempDir, name: &str ) -> String {
        let file = dir.child( name );
        file.write_str( "#!/bin/sh\n" ).unwrap();
        set_permissions( &file, Permissions::from_mode( 0o755 ) ).unwrap();
        file.path().display().to_string()
    }

    fn opts( all: bool, names: &[ &str ] ) -> WhichOpts {
        WhichOpts { all, names: names.iter().map( OsString::from ).collect() }
    }

    fn run( opts: &WhichOpts, search_path: &str ) -> ( bool, String ) {
        let mut out = vec![];
        let ok = which( opts, Some( search_path.as_ref() ), &mut out )
            .unwrap();
        ( ok, String::from_utf8( out ).unwrap() )
    }

    #[ test ]
    fn first_or_all() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let in_a = put_executable( &a, "prog" );
        let in_b = put_executable( &b, "prog" );
        let search_path =
            format!( "{}:{}", a.path().display(), b.path().display() );

        check!( run( &opts( false, &[ "prog" ] ), &search_path )
            == ( true, format!( "{in_a}\n" ) ) );
        check!( run( &opts( true, &[ "prog" ] ), &search_path )
            == ( true, format!( "{in_a}\n{in_b}\n" ) ) );
    }

    #[ test ]
    fn missing_name_fails_but_others_printed() {
        let a = TempDir::new().unwrap();
        let in_a = put_executable( &a, "prog" );
        let search_path = a.path().display().to_string();

        check!( run( &opts( false, &[ "nope", "prog" ] ), &search_path )
            == ( false, format!( "{in_a}\n" ) ) );
    }

    #[ test ]
    fn names_with_slash_not_searched() {
        let a = TempDir::new().unwrap();
        let in_a = put_executable( &a, "prog" );

        check!( run( &opts( false, &[ in_a.as_str() ] ), "/nonexistent" )
            == ( true, format!( "{in_a}\n" ) ) );
        check!( run( &opts( false, &[ "/nonexistent/prog" ] ), "" )
            == ( false, String::new() ) );
    }
}
