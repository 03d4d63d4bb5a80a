//! Resumable lookup of executables in a `$PATH`-like search path.
//!
//! Components are separated by `:`. A zero-length component, which
//! comes from a leading, trailing or doubled colon, stands for the
//! current working directory, see [POSIX XBD 8.3][1].
//!
//! Repeated empty components are probed again every time they show up,
//! "/a::::/b" tries the current directory three times. That's redundant
//! but it's what the letter of POSIX describes.
//!
//! [1]: https://pubs.opengroup.org/onlinepubs/9699919799/basedefs/V1_chap08.html#tag_08_03

use crate::IsExecutable;

use tracing::trace;

use std::ffi::OsStr;
use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::path::PathBuf;

const SEPARATOR: u8 = b':';

/// Position inside a search path: the suffix not searched yet,
/// or nothing once the search is exhausted.
///
/// This is a plain value. Passing it into a lookup never touches the
/// original, so independent searches over the same string can't
/// interfere with each other.
#[ derive( Debug, Clone, Copy, PartialEq, Eq, Default ) ]
pub struct PathCursor<'a> {
    rest: Option<&'a [u8]>,
}

impl<'a> PathCursor<'a> {
    /// Start searching from the beginning of `search_path`.
    ///
    /// An empty string has no components at all and gives an
    /// exhausted cursor.
    #[ inline ]
    #[ must_use ]
    pub fn new( search_path: &'a OsStr ) -> Self {
        let bytes = search_path.as_bytes();
        Self { rest: ( !bytes.is_empty() ).then_some( bytes ) }
    }

    /// Like [`Self::new`], but for a value which may be unset,
    /// e.g. the result of [`std::env::var_os`].
    #[ inline ]
    #[ must_use ]
    pub fn from_env_value( search_path: Option<&'a OsStr> ) -> Self {
        search_path.map_or_else( Self::exhausted, Self::new )
    }

    /// A cursor with nothing left to search.
    #[ inline ]
    #[ must_use ]
    pub const fn exhausted() -> Self {
        Self { rest: None }
    }

    #[ inline ]
    #[ must_use ]
    pub const fn is_exhausted( &self ) -> bool {
        self.rest.is_none()
    }

    /// The part of the search path which hasn't been tried yet.
    #[ inline ]
    #[ must_use ]
    pub fn remaining( &self ) -> Option<&'a OsStr> {
        self.rest.map( OsStr::from_bytes )
    }

    /// Find the next executable named `name`.
    ///
    /// Returns the match, if any, together with the cursor to resume
    /// from. The returned cursor points right after the component which
    /// produced the match, or is exhausted if that was the last one.
    /// When nothing matches both halves are empty.
    #[ inline ]
    #[ must_use ]
    pub fn next_executable(
        self,
        name: impl AsRef<OsStr>,
    ) -> ( Option<PathBuf>, Self ) {
        self.next_match_by( name.as_ref(), |path| path.is_executable() )
    }

    /// Same walk as [`Self::next_executable`], but candidates are
    /// judged by `probe` instead.
    ///
    /// Every component is handed to `probe` exactly once, strictly
    /// left to right.
    #[ tracing::instrument( level = "trace", skip( probe ) ) ]
    #[ must_use ]
    pub fn next_match_by<N, P>(
        self,
        name: N,
        mut probe: P,
    ) -> ( Option<PathBuf>, Self )
    where
        N: AsRef<OsStr> + std::fmt::Debug,
        P: FnMut( &Path ) -> bool,
    {
        let name = name.as_ref();
        let mut rest = self.rest;

        while let Some( current ) = rest {
            let ( component, after ) = match current
                .iter()
                .position( |b| *b == SEPARATOR )
            {
                Some( at ) => {
                    let ( head, tail ) = current.split_at( at );
                    // skip the separator itself
                    ( head, tail.get( 1.. ) )
                },
                None => ( current, None ),
            };

            let candidate = join_component( component, name );
            trace!( ?candidate, "probe" );

            if probe( &candidate ) {
                return ( Some( candidate ), Self { rest: after } )
            }

            rest = after;
        }

        ( None, Self::exhausted() )
    }
}

/// `component + "/" + name`, or `name` alone for the current directory.
///
/// No normalization happens, a trailing slash in `component` gives
/// a doubled slash.
fn join_component( component: &[u8], name: &OsStr ) -> PathBuf {
    if component.is_empty() {
        return PathBuf::from( name )
    }
    let mut joined = OsString::with_capacity( component.len() + 1 + name.len() );
    joined.push( OsStr::from_bytes( component ) );
    joined.push( "/" );
    joined.push( name );
    joined.into()
}

/// Search for `name` starting at `cursor`, advancing it in place.
///
/// Convenience over [`PathCursor::next_executable`] for call sites
/// which keep one cursor around.
#[ inline ]
pub fn find_executable(
    name: impl AsRef<OsStr>,
    cursor: &mut PathCursor<'_>,
) -> Option<PathBuf> {
    let ( found, next ) = cursor.next_executable( name );
    *cursor = next;
    found
}

/// Every executable named `name` along a search path, in order.
#[ derive( Debug, Clone ) ]
pub struct Executables<'a> {
    name: &'a OsStr,
    cursor: PathCursor<'a>,
}

impl<'a> Executables<'a> {
    #[ inline ]
    #[ must_use ]
    pub fn new( name: &'a OsStr, cursor: PathCursor<'a> ) -> Self {
        Self { name, cursor }
    }
}

impl Iterator for Executables<'_> {
    type Item = PathBuf;

    #[ inline ]
    fn next( &mut self ) -> Option<Self::Item> {
        find_executable( self.name, &mut self.cursor )
    }
}

impl std::iter::FusedIterator for Executables<'_> {}

/// Whether `name` is an executable somewhere in `$PATH`.
///
/// An unset `$PATH` behaves like an empty one.
#[ inline ]
#[ must_use ]
pub fn executable_exists( name: impl AsRef<OsStr> ) -> bool {
    let search_path = std::env::var_os( "PATH" );
    executable_exists_in( name, search_path.as_deref() )
}

/// Whether `name` is an executable somewhere in `search_path`.
#[ inline ]
#[ must_use ]
pub fn executable_exists_in(
    name: impl AsRef<OsStr>,
    search_path: Option<&OsStr>,
) -> bool {
    PathCursor::from_env_value( search_path )
        .next_executable( name )
        .0
        .is_some()
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

    fn put_executable( dir: &TempDir, name: &str ) -> PathBuf {
        let file = dir.child( name );
        file.write_str( "#!/bin/sh\n" ).unwrap();
        set_permissions( &file, Permissions::from_mode( 0o755 ) ).unwrap();
        file.to_path_buf()
    }

    /// Drive the resolver to exhaustion with a probe which accepts
    /// nothing, collecting every candidate it's asked about.
    fn visited( search_path: &str, name: &str ) -> Vec<PathBuf> {
        let mut seen = vec![];
        let ( found, next ) = PathCursor::new( search_path.as_ref() )
            .next_match_by( name, |p| { seen.push( p.to_owned() ); false } );
        assert!( found.is_none() );
        assert!( next.is_exhausted() );
        seen
    }

    #[ test ]
    fn visiting_order() {
        check!( visited( "/a:/b:/c", "x" ) == [
            PathBuf::from( "/a/x" ),
            PathBuf::from( "/b/x" ),
            PathBuf::from( "/c/x" ),
        ] );
    }

    #[ test ]
    fn empty_components_mean_current_dir() {
        check!( visited( ":/a", "x" ) == [
            PathBuf::from( "x" ), PathBuf::from( "/a/x" ),
        ] );
        check!( visited( "/a::/b", "x" ) == [
            PathBuf::from( "/a/x" ),
            PathBuf::from( "x" ),
            PathBuf::from( "/b/x" ),
        ] );
        check!( visited( "/a:", "x" ) == [
            PathBuf::from( "/a/x" ), PathBuf::from( "x" ),
        ] );
    }

    #[ test ]
    fn only_colons_probe_every_time() {
        check!( visited( ":::", "x" ) == vec![ PathBuf::from( "x" ); 4 ] );
        check!( visited( ":", "x" ) == vec![ PathBuf::from( "x" ); 2 ] );
    }

    #[ test ]
    fn no_normalization() {
        check!( visited( "/a/", "x" ) == [ PathBuf::from( "/a//x" ) ] );
        check!( visited( "rel", "sub/x" ) == [ PathBuf::from( "rel/sub/x" ) ] );
    }

    #[ test ]
    fn empty_search_path_is_exhausted() {
        check!( PathCursor::new( "".as_ref() ).is_exhausted() );
        check!( PathCursor::from_env_value( None ).is_exhausted() );
        check!( visited( "", "x" ).is_empty() );
    }

    #[ test ]
    fn exhausted_cursor_returns_nothing() {
        let mut called = false;
        let ( found, next ) = PathCursor::exhausted()
            .next_match_by( "x", |_| { called = true; true } );
        check!( found.is_none() );
        check!( next.is_exhausted() );
        check!( !called );
    }

    #[ test ]
    fn resume_after_match() {
        let cursor = PathCursor::new( "/a:/b:/c".as_ref() );

        let ( found, cursor ) = cursor
            .next_match_by( "x", |p| p != Path::new( "/a/x" ) );
        check!( found == Some( PathBuf::from( "/b/x" ) ) );
        check!( cursor.remaining() == Some( OsStr::new( "/c" ) ) );

        let ( found, cursor ) = cursor.next_match_by( "x", |_| true );
        check!( found == Some( PathBuf::from( "/c/x" ) ) );
        check!( cursor.is_exhausted() );
    }

    #[ test ]
    fn match_in_trailing_empty_component() {
        let ( found, cursor ) = PathCursor::new( "/a:".as_ref() )
            .next_match_by( "x", |p| p == Path::new( "x" ) );
        check!( found == Some( PathBuf::from( "x" ) ) );
        check!( cursor.is_exhausted() );
    }

    #[ test ]
    fn match_before_trailing_empty_component() {
        let ( found, cursor ) = PathCursor::new( "/a:".as_ref() )
            .next_match_by( "x", |_| true );
        check!( found == Some( PathBuf::from( "/a/x" ) ) );
        // the empty component after the colon is still pending
        check!( cursor.remaining() == Some( OsStr::new( "" ) ) );
        check!( !cursor.is_exhausted() );
    }

    #[ test ]
    fn found_only_in_second_dir() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let exe = put_executable( &b, "name" );

        let search_path =
            format!( "{}:{}", a.path().display(), b.path().display() );
        let mut cursor = PathCursor::new( search_path.as_ref() );

        check!( find_executable( "name", &mut cursor ) == Some( exe ) );
        check!( cursor.is_exhausted() );
        check!( find_executable( "name", &mut cursor ).is_none() );
    }

    #[ test ]
    fn non_executable_and_directories_skipped() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let c = TempDir::new().unwrap();

        a.child( "name" ).write_str( "plain" ).unwrap();
        b.child( "name" ).create_dir_all().unwrap();
        let exe = put_executable( &c, "name" );

        let search_path = format!( "{}:{}:{}",
            a.path().display(), b.path().display(), c.path().display() );
        let all = Executables::new(
            "name".as_ref(), PathCursor::new( search_path.as_ref() )
        ).collect::<Vec<_>>();
        check!( all == [ exe ] );
    }

    #[ test ]
    fn enumerate_all_matches() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let first = put_executable( &a, "name" );
        let second = put_executable( &b, "name" );

        let search_path = format!( "{}:/nonexistent:{}",
            a.path().display(), b.path().display() );
        let all = Executables::new(
            "name".as_ref(), PathCursor::new( search_path.as_ref() )
        ).collect::<Vec<_>>();
        check!( all == [ first, second ] );
    }

    #[ test ]
    fn exists_in() {
        let a = TempDir::new().unwrap();
        put_executable( &a, "name" );
        let search_path = a.path().as_os_str();

        check!( executable_exists_in( "name", Some( search_path ) ) );
        check!( !executable_exists_in( "other", Some( search_path ) ) );
        check!( !executable_exists_in( "name", None ) );
        check!( !executable_exists_in( "name", Some( "".as_ref() ) ) );
    }
}
