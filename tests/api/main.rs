mod card;
mod scan;
mod students;
