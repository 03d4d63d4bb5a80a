//! Programs built into exequi.

use crate::which::which;
use crate::which::WhichOpts;

use ino_exec::Applets;

use tracing::debug;

use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::Path;

#[ derive( Debug ) ]
pub struct Applet {
    pub name: &'static str,
    /// Runs inside whoever launches it, no exec needed.
    pub noexec: bool,
    main: fn( &[OsString] ) -> i32,
}

impl Applet {
    #[ inline ]
    pub fn main( &self, argv: &[OsString] ) -> i32 {
        ( self.main )( argv )
    }
}

pub const APPLETS: &[ Applet ] = &[
    Applet { name: "false", noexec: true, main: |_| 1 },
    Applet { name: "true", noexec: true, main: |_| 0 },
    Applet { name: "which", noexec: false, main: which_main },
];

/// The table handed to [`ino_exec::Dispatcher`].
#[ derive( Debug, Clone, Copy, Default ) ]
pub struct Builtins;

impl Builtins {
    /// The applet we're supposed to be, judging by `argv[0]`.
    pub fn from_argv0( argv0: &OsStr ) -> Option<&'static Applet> {
        Path::new( argv0 )
            .file_name()
            .and_then( |name| Self.find( name ) )
    }
}

impl Applets for Builtins {
    type Handle = &'static Applet;

    #[ inline ]
    fn find( &self, name: &OsStr ) -> Option<Self::Handle> {
        APPLETS.iter().find( |it| name == it.name )
    }

    #[ inline ]
    fn is_noexec( &self, handle: Self::Handle ) -> bool {
        handle.noexec
    }

    #[ tracing::instrument( skip( self ) ) ]
    fn run(
        &self,
        handle: Self::Handle,
        name: &OsStr,
        argv: &[OsString],
    ) -> i32 {
        debug!( "run applet" );
        handle.main( argv )
    }
}

fn which_main( argv: &[OsString] ) -> i32 {
    let opts = match <WhichOpts as clap::Parser>::try_parse_from( argv ) {
        Ok( opts ) => opts,
        Err( err ) => {
            let _ = err.print();
            return err.exit_code()
        },
    };

    let search_path = std::env::var_os( "PATH" );
    let mut stdout = std::io::stdout().lock();

    match which( &opts, search_path.as_deref(), &mut stdout ) {
        Ok( true ) => 0,
        Ok( false ) => 1,
        Err( err ) => {
            eprintln!( "which: {err}" );
            1
        },
    }
}

#[ cfg( test ) ]
mod test {
    use super::*;
    use assert2::check;
    use assert2::let_assert;

    #[ test ]
    fn lookup_by_argv0() {
        let_assert!( Some( applet ) = Builtins::from_argv0(
            "/usr/local/bin/which".as_ref() ) );
        check!( applet.name == "which" );
        check!( !applet.noexec );

        check!( Builtins::from_argv0( "exequi".as_ref() ).is_none() );
        check!( Builtins::from_argv0( "".as_ref() ).is_none() );
    }

    #[ test ]
    fn true_and_false() {
        let_assert!( Some( t ) = Builtins.find( "true".as_ref() ) );
        let_assert!( Some( f ) = Builtins.find( "false".as_ref() ) );
        check!( Builtins.is_noexec( t ) );
        check!( Builtins.run( t, "true".as_ref(), &[] ) == 0 );
        check!( Builtins.run( f, "false".as_ref(), &[] ) == 1 );
    }

    #[ test ]
    fn which_rejects_missing_names() {
        // clap usage error
        check!( which_main( &[ "which".into() ] ) == 2 );
    }
}
