mod duplicates;
mod merge;
mod minimize;
mod transformers;
