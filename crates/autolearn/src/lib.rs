/*
An active automaton learning engine: an L* learner for regular languages
(Angluin, "Learning Regular Sets from Queries and Counterexamples",
https://people.eecs.berkeley.edu/~dawnsong/teaching/s10/papers/angluin87.pdf)
plus a stratified learner for visibly one-counter languages, built on a
level-indexed family of observation tables instead of a single flat one.
 */

pub mod alphabet;
pub mod automaton;
pub mod behaviour;
pub mod error;
pub mod learner;
pub mod one_counter;
pub mod periodicity;
pub mod stratified;
pub mod table;
pub mod teacher;

pub mod teachers {
    pub mod fn_teacher;
    pub mod regex_teacher;
}
