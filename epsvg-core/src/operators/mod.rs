//! The operator table.
//!
//! Every built-in operator is an [`OperatorDef`]: a name, a native
//! function over the interpreter, and a role telling `exit` and `stop` how
//! to treat it when it sits on the execution stack. The continuation
//! operators (`@for`, `@loop`, ...) are statics next to the operators that
//! schedule them and never appear in `systemdict`.

pub(crate) mod array;
pub(crate) mod color;
pub(crate) mod control;
pub(crate) mod convert;
pub(crate) mod dict;
pub(crate) mod font;
pub(crate) mod gstate;
pub(crate) mod io;
pub(crate) mod math;
pub(crate) mod matrix;
pub(crate) mod misc;
pub(crate) mod paint;
pub(crate) mod params;
pub(crate) mod path;
pub(crate) mod relational;
pub(crate) mod resource;
pub(crate) mod stack;
pub(crate) mod string;
pub(crate) mod vm;

use std::fmt;

use crate::error::InterpResult;
use crate::interpreter::Interpreter;

/// Native implementation of an operator.
pub type OperatorFn = fn(&mut Interpreter) -> InterpResult<()>;

/// How an operator behaves as an execution-stack entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpRole {
    Plain,
    /// Resumes a loop; owns one continuation frame. Target of `exit`.
    Loop,
    /// Closes a `stopped` context; owns one continuation frame.
    Stopped,
    /// Boundary of a host callback. `exit` may not cross it.
    Marker,
}

/// A built-in operator.
pub struct OperatorDef {
    pub name: &'static str,
    pub func: OperatorFn,
    pub role: OpRole,
}

impl OperatorDef {
    #[must_use]
    pub const fn new(name: &'static str, func: OperatorFn) -> Self {
        Self::with_role(name, func, OpRole::Plain)
    }

    #[must_use]
    pub const fn with_role(name: &'static str, func: OperatorFn, role: OpRole) -> Self {
        Self { name, func, role }
    }
}

impl fmt::Debug for OperatorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}--", self.name)
    }
}

/// Find a `systemdict` operator by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static OperatorDef> {
    OPERATORS.iter().find(|op| op.name == name)
}

macro_rules! ops {
    ($($name:literal => $func:path),* $(,)?) => {
        &[$(OperatorDef::new($name, $func)),*]
    };
}

/// Every operator installed in `systemdict`.
pub static OPERATORS: &[OperatorDef] = ops![
    // stack
    "pop" => stack::pop,
    "exch" => stack::exch,
    "dup" => stack::dup,
    "copy" => stack::copy,
    "index" => stack::index,
    "roll" => stack::roll,
    "clear" => stack::clear,
    "count" => stack::count,
    "mark" => stack::mark,
    "cleartomark" => stack::cleartomark,
    "counttomark" => stack::counttomark,
    // arithmetic
    "add" => math::add,
    "sub" => math::sub,
    "mul" => math::mul,
    "div" => math::div,
    "idiv" => math::idiv,
    "mod" => math::modulo,
    "abs" => math::abs,
    "neg" => math::neg,
    "ceiling" => math::ceiling,
    "floor" => math::floor,
    "round" => math::round,
    "truncate" => math::truncate,
    "sqrt" => math::sqrt,
    "atan" => math::atan,
    "cos" => math::cos,
    "sin" => math::sin,
    "exp" => math::exp,
    "ln" => math::ln,
    "log" => math::log,
    "rand" => math::rand,
    "srand" => math::srand,
    "rrand" => math::rrand,
    // relational, boolean and bitwise
    "eq" => relational::eq,
    "ne" => relational::ne,
    "gt" => relational::gt,
    "ge" => relational::ge,
    "lt" => relational::lt,
    "le" => relational::le,
    "and" => relational::and,
    "or" => relational::or,
    "xor" => relational::xor,
    "not" => relational::not,
    "bitshift" => relational::bitshift,
    // type, attribute and conversion
    "type" => convert::type_op,
    "cvlit" => convert::cvlit,
    "cvx" => convert::cvx,
    "xcheck" => convert::xcheck,
    "executeonly" => convert::executeonly,
    "noaccess" => convert::noaccess,
    "readonly" => convert::readonly,
    "rcheck" => convert::rcheck,
    "wcheck" => convert::wcheck,
    "cvi" => convert::cvi,
    "cvn" => convert::cvn,
    "cvr" => convert::cvr,
    "cvrs" => convert::cvrs,
    "cvs" => convert::cvs,
    // arrays and polymorphic access
    "array" => array::array,
    "[" => stack::mark,
    "]" => array::array_from_mark,
    "aload" => array::aload,
    "astore" => array::astore,
    "length" => array::length,
    "get" => array::get,
    "put" => array::put,
    "getinterval" => array::getinterval,
    "putinterval" => array::putinterval,
    "packedarray" => array::packedarray,
    "setpacking" => array::setpacking,
    "currentpacking" => array::currentpacking,
    // strings
    "string" => string::string,
    "anchorsearch" => string::anchorsearch,
    "search" => string::search,
    "token" => string::token,
    // dictionaries
    "dict" => dict::dict,
    "<<" => stack::mark,
    ">>" => dict::dict_from_mark,
    "maxlength" => dict::maxlength,
    "begin" => dict::begin,
    "end" => dict::end,
    "def" => dict::def,
    "load" => dict::load,
    "store" => dict::store,
    "known" => dict::known,
    "undef" => dict::undef,
    "where" => dict::where_op,
    "currentdict" => dict::currentdict,
    "countdictstack" => dict::countdictstack,
    "dictstack" => dict::dictstack,
    "cleardictstack" => dict::cleardictstack,
    // control
    "exec" => control::exec,
    "if" => control::if_op,
    "ifelse" => control::ifelse,
    "for" => control::for_op,
    "repeat" => control::repeat,
    "loop" => control::loop_op,
    "forall" => control::forall,
    "exit" => control::exit,
    "stop" => control::stop,
    "stopped" => control::stopped,
    "countexecstack" => control::countexecstack,
    "execstack" => control::execstack,
    "quit" => control::quit,
    "bind" => control::bind,
    ".errorproc" => control::errorproc,
    ".handleerror" => control::handleerror,
    // VM
    "save" => vm::save,
    "restore" => vm::restore,
    "setglobal" => vm::setglobal,
    "currentglobal" => vm::currentglobal,
    "gcheck" => vm::gcheck,
    "vmstatus" => vm::vmstatus,
    // parameters
    "currentuserparams" => params::currentuserparams,
    "setuserparams" => params::setuserparams,
    "currentsystemparams" => params::currentsystemparams,
    "setsystemparams" => params::setsystemparams,
    // files
    "print" => io::print,
    "=" => io::print_text,
    "==" => io::print_syntax,
    "stack" => io::stack,
    "pstack" => io::pstack,
    "flush" => io::flush,
    "currentfile" => io::currentfile,
    "closefile" => io::closefile,
    "read" => io::read,
    "readstring" => io::readstring,
    "readline" => io::readline,
    "readhexstring" => io::readhexstring,
    "bytesavailable" => io::bytesavailable,
    "flushfile" => io::flushfile,
    "file" => io::file,
    "run" => io::run,
    "write" => io::write,
    "writestring" => io::writestring,
    "status" => io::status,
    "filter" => io::filter,
    // time and interpreter facts
    "realtime" => misc::realtime,
    "usertime" => misc::usertime,
    "version" => misc::version,
    "languagelevel" => misc::languagelevel,
    "revision" => misc::revision,
    "serialnumber" => misc::serialnumber,
    // graphics state
    "gsave" => gstate::gsave,
    "grestore" => gstate::grestore,
    "grestoreall" => gstate::grestoreall,
    "initgraphics" => gstate::initgraphics,
    "setlinewidth" => gstate::setlinewidth,
    "currentlinewidth" => gstate::currentlinewidth,
    "setlinecap" => gstate::setlinecap,
    "currentlinecap" => gstate::currentlinecap,
    "setlinejoin" => gstate::setlinejoin,
    "currentlinejoin" => gstate::currentlinejoin,
    "setmiterlimit" => gstate::setmiterlimit,
    "currentmiterlimit" => gstate::currentmiterlimit,
    "setdash" => gstate::setdash,
    "currentdash" => gstate::currentdash,
    "setflat" => gstate::setflat,
    "currentflat" => gstate::currentflat,
    "setstrokeadjust" => gstate::setstrokeadjust,
    "currentstrokeadjust" => gstate::currentstrokeadjust,
    "settransfer" => gstate::settransfer,
    "currenttransfer" => gstate::currenttransfer,
    "setblackgeneration" => gstate::setblackgeneration,
    "currentblackgeneration" => gstate::currentblackgeneration,
    "setundercolorremoval" => gstate::setundercolorremoval,
    "currentundercolorremoval" => gstate::currentundercolorremoval,
    "sethalftone" => gstate::sethalftone,
    "currenthalftone" => gstate::currenthalftone,
    "setscreen" => gstate::setscreen,
    "currentscreen" => gstate::currentscreen,
    "setoverprint" => gstate::setoverprint,
    "currentoverprint" => gstate::currentoverprint,
    // color
    "setgray" => color::setgray,
    "currentgray" => color::currentgray,
    "setrgbcolor" => color::setrgbcolor,
    "currentrgbcolor" => color::currentrgbcolor,
    "sethsbcolor" => color::sethsbcolor,
    "currenthsbcolor" => color::currenthsbcolor,
    "setcmykcolor" => color::setcmykcolor,
    "currentcmykcolor" => color::currentcmykcolor,
    "setcolorspace" => color::setcolorspace,
    "currentcolorspace" => color::currentcolorspace,
    "setcolor" => color::setcolor,
    "currentcolor" => color::currentcolor,
    // matrices and coordinates
    "matrix" => matrix::matrix,
    "initmatrix" => matrix::initmatrix,
    "identmatrix" => matrix::identmatrix,
    "defaultmatrix" => matrix::defaultmatrix,
    "currentmatrix" => matrix::currentmatrix,
    "setmatrix" => matrix::setmatrix,
    "translate" => matrix::translate,
    "scale" => matrix::scale,
    "rotate" => matrix::rotate,
    "concat" => matrix::concat,
    "concatmatrix" => matrix::concatmatrix,
    "transform" => matrix::transform,
    "dtransform" => matrix::dtransform,
    "itransform" => matrix::itransform,
    "idtransform" => matrix::idtransform,
    "invertmatrix" => matrix::invertmatrix,
    // path construction
    "newpath" => path::newpath,
    "currentpoint" => path::currentpoint,
    "moveto" => path::moveto,
    "rmoveto" => path::rmoveto,
    "lineto" => path::lineto,
    "rlineto" => path::rlineto,
    "curveto" => path::curveto,
    "rcurveto" => path::rcurveto,
    "arc" => path::arc,
    "arcn" => path::arcn,
    "arct" => path::arct,
    "arcto" => path::arcto,
    "closepath" => path::closepath,
    "flattenpath" => path::flattenpath,
    "reversepath" => path::reversepath,
    "pathbbox" => path::pathbbox,
    "pathforall" => path::pathforall,
    "clippath" => path::clippath,
    "initclip" => path::initclip,
    "rectclip" => path::rectclip,
    "clip" => path::clip,
    "eoclip" => path::eoclip,
    "clipsave" => path::clipsave,
    "cliprestore" => path::cliprestore,
    // painting
    "erasepage" => paint::erasepage,
    "fill" => paint::fill,
    "eofill" => paint::eofill,
    "stroke" => paint::stroke,
    "rectfill" => paint::rectfill,
    "rectstroke" => paint::rectstroke,
    "shfill" => paint::shfill,
    "image" => paint::image,
    "imagemask" => paint::imagemask,
    "colorimage" => paint::colorimage,
    "showpage" => paint::showpage,
    "copypage" => paint::copypage,
    "nulldevice" => paint::nulldevice,
    "setpagedevice" => paint::setpagedevice,
    "currentpagedevice" => paint::currentpagedevice,
    // fonts and text
    "findfont" => font::findfont,
    "scalefont" => font::scalefont,
    "makefont" => font::makefont,
    "setfont" => font::setfont,
    "currentfont" => font::currentfont,
    "rootfont" => font::currentfont,
    "selectfont" => font::selectfont,
    "definefont" => font::definefont,
    "undefinefont" => font::undefinefont,
    "show" => font::show,
    "ashow" => font::ashow,
    "widthshow" => font::widthshow,
    "awidthshow" => font::awidthshow,
    "kshow" => font::kshow,
    "cshow" => font::cshow,
    "xshow" => font::xshow,
    "yshow" => font::yshow,
    "xyshow" => font::xyshow,
    "glyphshow" => font::glyphshow,
    "stringwidth" => font::stringwidth,
    "charpath" => font::charpath,
    "setcharwidth" => font::setcharwidth,
    "setcachedevice" => font::setcachedevice,
    "setcachedevice2" => font::setcachedevice2,
    // resources
    "defineresource" => resource::defineresource,
    "findresource" => resource::findresource,
    "findencoding" => resource::findencoding,
    "resourcestatus" => resource::resourcestatus,
    "undefineresource" => resource::undefineresource,
    "resourceforall" => resource::resourceforall,
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_are_unique() {
        let mut seen = HashSet::new();
        for op in OPERATORS {
            assert!(seen.insert(op.name), "duplicate operator {}", op.name);
        }
    }

    #[test]
    fn continuation_operators_stay_out_of_the_table() {
        assert!(OPERATORS.iter().all(|op| !op.name.starts_with('@')));
        assert!(OPERATORS.iter().all(|op| op.role == OpRole::Plain));
    }

    #[test]
    fn lookup_finds_operators() {
        assert_eq!(lookup("add").map(|op| op.name), Some("add"));
        assert!(lookup("@for").is_none());
        assert!(lookup("nosuchop").is_none());
    }
}
