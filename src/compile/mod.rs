pub mod latexmk;
