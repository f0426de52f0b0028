pub mod pdb;
